//! Paths of a volume's source files inside the input tree.
//!
//! ```text
//! {input}/lists/{type}/{journal}/{journal}{volume}.top      (or .top.map)
//! {input}/lists/{type}/{journal}/{journal}{volume}.dat
//! {input}/bitmaps/{type}/{journal}/{volume}/600/            page images
//! {input}/ocr/{type}/{journal}/{volume}/{page}.txt          OCR bodies
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::model::JournalVolume;
use crate::parser::{CLASSIC_SUFFIX, MAP_SUFFIX};

pub const LISTS_DIR: &str = "lists";
pub const BITMAPS_DIR: &str = "bitmaps";
pub const OCR_DIR: &str = "ocr";
/// Resolution directory holding the page images.
pub const RESOLUTION_DIR: &str = "600";
pub const DAT_SUFFIX: &str = ".dat";
pub const OCR_SUFFIX: &str = ".txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayout {
    root: PathBuf,
}

impl InputLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lists_root(&self) -> PathBuf {
        self.root.join(LISTS_DIR)
    }

    pub fn list_dir(&self, kind: &str, journal: &str) -> PathBuf {
        self.lists_root().join(kind).join(journal)
    }

    pub fn image_dir(&self, kind: &str, journal: &str, volume: &str) -> PathBuf {
        self.root
            .join(BITMAPS_DIR)
            .join(kind)
            .join(journal)
            .join(volume)
            .join(RESOLUTION_DIR)
    }

    pub fn ocr_dir(&self, kind: &str, journal: &str, volume: &str) -> PathBuf {
        self.root
            .join(OCR_DIR)
            .join(kind)
            .join(journal)
            .join(volume)
    }

    /// Resolves every source location of a cataloged volume.
    pub fn sources(&self, volume: &JournalVolume) -> VolumeSources {
        VolumeSources::new(self, &volume.kind, &volume.journal, &volume.volume)
    }
}

/// Source locations of one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSources {
    pub kind: String,
    pub journal: String,
    pub volume: String,
    pub list_dir: PathBuf,
    pub image_dir: PathBuf,
    pub ocr_dir: PathBuf,
}

impl VolumeSources {
    pub fn new(layout: &InputLayout, kind: &str, journal: &str, volume: &str) -> Self {
        Self {
            kind: kind.to_string(),
            journal: journal.to_string(),
            volume: volume.to_string(),
            list_dir: layout.list_dir(kind, journal),
            image_dir: layout.image_dir(kind, journal, volume),
            ocr_dir: layout.ocr_dir(kind, journal, volume),
        }
    }

    /// File-name prefix shared by this volume's list files.
    pub fn list_prefix(&self) -> String {
        format!("{}{}", self.journal, self.volume)
    }

    /// The page list to read. A `.top.map` file wins over a classic `.top`.
    pub fn top_file(&self) -> PathBuf {
        let map = self
            .list_dir
            .join(format!("{}{}", self.list_prefix(), MAP_SUFFIX));
        if map.is_file() {
            map
        } else {
            self.list_dir
                .join(format!("{}{}", self.list_prefix(), CLASSIC_SUFFIX))
        }
    }

    pub fn dat_file(&self) -> PathBuf {
        self.list_dir
            .join(format!("{}{}", self.list_prefix(), DAT_SUFFIX))
    }

    pub fn ocr_file(&self, page_name: &str) -> PathBuf {
        self.ocr_dir.join(format!("{}{}", page_name, OCR_SUFFIX))
    }

    /// Whether a file in the list directory belongs to this volume.
    pub fn owns_list_file(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(&self.list_prefix())
            .map(|rest| rest.starts_with('.'))
            .unwrap_or(false)
    }
}

/// Extracts the volume code from a page-list file name, given its journal.
///
/// `test.0001.top` in journal `test.` yields `0001`.
pub fn volume_from_list_file(file_name: &str, journal: &str) -> Option<String> {
    let stem = file_name
        .strip_suffix(MAP_SUFFIX)
        .or_else(|| file_name.strip_suffix(CLASSIC_SUFFIX))?;
    let volume = stem.strip_prefix(journal)?;
    (!volume.is_empty()).then(|| volume.to_string())
}
