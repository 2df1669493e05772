//! Builders for input trees and configuration files.

#![allow(dead_code)]

use std::path::Path;

use image::{GrayImage, ImageFormat, RgbImage};

use scanpipe::layout::{InputLayout, VolumeSources};

const CLASSIC_HEADER: &str = "ADS page list\nformat 1\n\n-----------\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// 8-bit greyscale `.tif`.
    Grey,
    /// RGB `.tif`.
    Color,
    /// Extensionless bilevel companion only.
    Bilevel,
    /// No image at all.
    Missing,
}

/// One volume's source files, written by [`VolumeFixture::write`].
pub struct VolumeFixture {
    pub kind: String,
    pub journal: String,
    pub volume: String,
    map_grammar: bool,
    top_rows: Vec<String>,
    dat_rows: Vec<String>,
    images: Vec<(String, ImageKind)>,
    ocr: Vec<(String, String)>,
}

impl VolumeFixture {
    pub fn new(journal: &str, volume: &str) -> Self {
        Self {
            kind: "seri".to_string(),
            journal: journal.to_string(),
            volume: volume.to_string(),
            map_grammar: false,
            top_rows: Vec::new(),
            dat_rows: Vec::new(),
            images: Vec::new(),
            ocr: Vec::new(),
        }
    }

    /// Adds a page-list row. The first whitespace-separated column is the
    /// page code and gets a greyscale TIFF.
    pub fn page(self, row: &str) -> Self {
        self.page_with(row, ImageKind::Grey)
    }

    pub fn page_with(mut self, row: &str, image: ImageKind) -> Self {
        let code = row.split_whitespace().next().unwrap_or_default().to_string();
        self.top_rows.push(row.to_string());
        self.images.push((code, image));
        self
    }

    /// Adds an image for a page code without listing it.
    pub fn image(mut self, code: &str, image: ImageKind) -> Self {
        self.images.push((code.to_string(), image));
        self
    }

    /// Writes `.top.map` instead of the classic `.top`.
    pub fn map_grammar(mut self) -> Self {
        self.map_grammar = true;
        self
    }

    pub fn article(mut self, row: &str) -> Self {
        self.dat_rows.push(row.to_string());
        self
    }

    pub fn ocr(mut self, page: &str, text: &str) -> Self {
        self.ocr.push((page.to_string(), text.to_string()));
        self
    }

    pub fn sources(&self, root: &Path) -> VolumeSources {
        VolumeSources::new(&InputLayout::new(root), &self.kind, &self.journal, &self.volume)
    }

    pub fn write(&self, root: &Path) -> VolumeSources {
        let sources = self.sources(root);
        std::fs::create_dir_all(&sources.list_dir).unwrap();
        std::fs::create_dir_all(&sources.image_dir).unwrap();

        let prefix = sources.list_prefix();
        let (name, header) = if self.map_grammar {
            (format!("{}.top.map", prefix), "")
        } else {
            (format!("{}.top", prefix), CLASSIC_HEADER)
        };
        let mut top = header.to_string();
        for row in &self.top_rows {
            top.push_str(row);
            top.push('\n');
        }
        std::fs::write(sources.list_dir.join(name), top).unwrap();

        if !self.dat_rows.is_empty() {
            let dat = self.dat_rows.join("\n") + "\n";
            std::fs::write(sources.dat_file(), dat).unwrap();
        }

        for (code, kind) in &self.images {
            let archival = sources.image_dir.join(format!("{}.tif", code));
            match kind {
                ImageKind::Grey => GrayImage::new(40, 60)
                    .save_with_format(&archival, ImageFormat::Tiff)
                    .unwrap(),
                ImageKind::Color => RgbImage::new(40, 60)
                    .save_with_format(&archival, ImageFormat::Tiff)
                    .unwrap(),
                ImageKind::Bilevel => GrayImage::new(20, 30)
                    .save_with_format(sources.image_dir.join(code), ImageFormat::Tiff)
                    .unwrap(),
                ImageKind::Missing => {}
            }
        }

        if !self.ocr.is_empty() {
            std::fs::create_dir_all(&sources.ocr_dir).unwrap();
            for (page, text) in &self.ocr {
                std::fs::write(sources.ocr_file(page), text).unwrap();
            }
        }

        sources
    }
}

/// Builds configuration JSON documents.
pub struct ConfigBuilder {
    input_directory: String,
    database_path: Option<String>,
    worker_count: Option<usize>,
    projects_file: Option<String>,
    bucket_directory: String,
    search_url: String,
    remote_url: String,
    log_json: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            input_directory: "/scans".to_string(),
            database_path: None,
            worker_count: None,
            projects_file: None,
            bucket_directory: "/bucket".to_string(),
            search_url: "http://localhost:9200".to_string(),
            remote_url: "http://localhost:8080/volumes".to_string(),
            log_json: false,
        }
    }

    pub fn input_directory(mut self, path: &Path) -> Self {
        self.input_directory = path.display().to_string();
        self
    }

    pub fn database_path(mut self, path: &Path) -> Self {
        self.database_path = Some(path.display().to_string());
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn projects_file(mut self, path: &Path) -> Self {
        self.projects_file = Some(path.display().to_string());
        self
    }

    pub fn bucket_directory(mut self, path: &Path) -> Self {
        self.bucket_directory = path.display().to_string();
        self
    }

    pub fn search_url(mut self, url: &str) -> Self {
        self.search_url = url.to_string();
        self
    }

    pub fn log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    pub fn build_json(&self) -> String {
        let mut config = serde_json::json!({
            "version": "1.0",
            "input_directory": self.input_directory,
            "logging": { "level": "debug", "json": self.log_json },
            "storage": { "bucket_directory": self.bucket_directory },
            "search": { "url": self.search_url, "index": "scan-test", "timeout_secs": 5 },
            "remote": { "url": self.remote_url, "timeout_secs": 5 }
        });
        if let Some(path) = &self.database_path {
            config["database_path"] = serde_json::json!(path);
        }
        if let Some(count) = self.worker_count {
            config["worker_count"] = serde_json::json!(count);
        }
        if let Some(path) = &self.projects_file {
            config["projects_file"] = serde_json::json!(path);
        }
        serde_json::to_string_pretty(&config).unwrap()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
