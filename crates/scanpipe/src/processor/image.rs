use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::tiff::TiffDecoder;
use image::ImageDecoder;
use log::debug;
use walkdir::WalkDir;

use crate::catalog::model::{Page, PageColor};
use crate::catalog::Catalog;
use crate::error::ImageError;

/// Display derivatives that are never read.
const DERIVATIVE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const ARCHIVAL_SUFFIXES: &[&str] = &[".tif", ".tiff"];

/// One page image in a volume's image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub file_name: String,
    /// The page code the file belongs to.
    pub page_name: String,
    /// `true` for the `.tif` archival scan, `false` for the extensionless
    /// bilevel file.
    pub archival: bool,
}

impl ImageFile {
    fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();

        let lower = file_name.to_ascii_lowercase();
        let is_derivative = DERIVATIVE_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)));
        if is_derivative {
            return None;
        }

        let (page_name, archival) = match ARCHIVAL_SUFFIXES
            .iter()
            .find(|suffix| lower.ends_with(*suffix))
        {
            Some(suffix) => (file_name[..file_name.len() - suffix.len()].to_string(), true),
            None => (file_name.clone(), false),
        };

        Some(Self {
            path: path.to_path_buf(),
            file_name,
            page_name,
            archival,
        })
    }
}

/// Lists page images in lexicographic file-name order, skipping derivatives.
///
/// The ordering puts a bilevel file `X` before its archival companion
/// `X.tif`, which lets the archival properties overwrite the bilevel ones.
pub fn list_image_files(directory: &Path) -> Result<Vec<ImageFile>, ImageError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ImageError::ListDirectory {
            path: directory.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file) = ImageFile::from_path(entry.path()) {
            files.push(file);
        }
    }

    Ok(files)
}

/// Properties read from a TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

/// Reads dimensions and channel count without decoding pixel data.
pub fn read_header(path: &Path) -> Result<ImageHeader, ImageError> {
    let header_error = |source| ImageError::Header {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| header_error(image::ImageError::IoError(e)))?;
    let decoder = TiffDecoder::new(BufReader::new(file)).map_err(header_error)?;

    let (width, height) = decoder.dimensions();
    Ok(ImageHeader {
        width,
        height,
        channels: decoder.color_type().channel_count(),
    })
}

/// Enriches a volume's cataloged pages with properties from their images.
pub struct ImageMetadataReader<'a> {
    catalog: &'a dyn Catalog,
    volume_id: String,
    directory: PathBuf,
}

impl<'a> ImageMetadataReader<'a> {
    pub fn new(catalog: &'a dyn Catalog, volume_id: &str, directory: &Path) -> Self {
        Self {
            catalog,
            volume_id: volume_id.to_string(),
            directory: directory.to_path_buf(),
        }
    }

    /// Fails on the first cataloged page with neither a bilevel nor an
    /// archival file.
    pub fn check_completeness(&self, files: &[ImageFile]) -> Result<(), ImageError> {
        let available: HashSet<&str> = files.iter().map(|f| f.page_name.as_str()).collect();

        for page in self.catalog.pages_for_volume(&self.volume_id)? {
            if !available.contains(page.name.as_str()) {
                return Err(ImageError::MissingImage {
                    page: page.name,
                    directory: self.directory.clone(),
                });
            }
        }
        Ok(())
    }

    /// Runs the completeness check, then reads every image header and saves
    /// the enriched pages. Returns the number of pages updated.
    pub fn apply(&self) -> Result<usize, ImageError> {
        let _span = tracing::info_span!("processor.image", volume_id = %self.volume_id).entered();

        let files = list_image_files(&self.directory)?;
        self.check_completeness(&files)?;

        let mut updated: BTreeMap<String, Page> = BTreeMap::new();

        for file in &files {
            if !updated.contains_key(&file.page_name) {
                match self.catalog.find_page(&self.volume_id, &file.page_name)? {
                    Some(page) => {
                        updated.insert(file.page_name.clone(), page);
                    }
                    None => {
                        debug!(
                            "Skipping orphaned image {} (page not in list)",
                            file.path.display()
                        );
                        continue;
                    }
                }
            }
            let Some(page) = updated.get_mut(&file.page_name) else {
                continue;
            };

            let header = read_header(&file.path)?;
            page.width = Some(header.width);
            page.height = Some(header.height);
            if file.archival {
                page.color_type = if header.channels > 1 {
                    PageColor::Color
                } else {
                    PageColor::Greyscale
                };
            }
        }

        for page in updated.values() {
            self.catalog.save_page(page)?;
        }

        debug!(
            "Read {} image headers for {} pages in {}",
            files.len(),
            updated.len(),
            self.directory.display()
        );
        Ok(updated.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::parser::PageCode;
    use image::{GrayImage, ImageFormat, RgbImage};
    use tempfile::TempDir;

    fn write_grey(path: &Path, width: u32, height: u32) {
        GrayImage::new(width, height)
            .save_with_format(path, ImageFormat::Tiff)
            .unwrap();
    }

    fn write_rgb(path: &Path, width: u32, height: u32) {
        RgbImage::new(width, height)
            .save_with_format(path, ImageFormat::Tiff)
            .unwrap();
    }

    fn catalog_with_pages(names: &[&str]) -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        for (i, name) in names.iter().enumerate() {
            let page = Page::new("vol-1", &PageCode::decode(name).unwrap(), i as u32 + 1, None);
            catalog.upsert_page(&page).unwrap();
        }
        catalog
    }

    #[test]
    fn test_image_file_classification() {
        let file = ImageFile::from_path(Path::new("/x/0000001.000.tif")).unwrap();
        assert_eq!(file.page_name, "0000001.000");
        assert!(file.archival);

        let file = ImageFile::from_path(Path::new("/x/0000001.000.tiff")).unwrap();
        assert_eq!(file.page_name, "0000001.000");
        assert!(file.archival);

        let file = ImageFile::from_path(Path::new("/x/0000001.000")).unwrap();
        assert_eq!(file.page_name, "0000001.000");
        assert!(!file.archival);

        assert!(ImageFile::from_path(Path::new("/x/0000001.000.png")).is_none());
        assert!(ImageFile::from_path(Path::new("/x/0000001.000.jpg")).is_none());
    }

    #[test]
    fn test_listing_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        for name in ["0000002.000", "0000001.000.tif", "0000001.000", "0000001.000.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<_> = list_image_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["0000001.000", "0000001.000.tif", "0000002.000"]);
    }

    #[test]
    fn test_read_header() {
        let dir = TempDir::new().unwrap();
        let grey = dir.path().join("grey.tif");
        let rgb = dir.path().join("rgb.tif");
        write_grey(&grey, 12, 34);
        write_rgb(&rgb, 5, 6);

        assert_eq!(
            read_header(&grey).unwrap(),
            ImageHeader {
                width: 12,
                height: 34,
                channels: 1
            }
        );
        assert_eq!(read_header(&rgb).unwrap().channels, 3);
    }

    #[test]
    fn test_corrupt_header_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("0000001.000.tif");
        std::fs::write(&path, b"not a tiff").unwrap();

        let err = read_header(&path).unwrap_err();
        assert!(err.to_string().contains("0000001.000.tif"));
    }

    #[test]
    fn test_archival_file_wins() {
        let dir = TempDir::new().unwrap();
        write_grey(&dir.path().join("0000001.000"), 10, 20);
        write_rgb(&dir.path().join("0000001.000.tif"), 30, 40);
        write_grey(&dir.path().join("0000002.000"), 50, 60);
        write_grey(&dir.path().join("0000003.000.tif"), 70, 80);
        write_grey(&dir.path().join("0000099.000"), 1, 1);

        let catalog = catalog_with_pages(&["0000001.000", "0000002.000", "0000003.000"]);
        let reader = ImageMetadataReader::new(&catalog, "vol-1", dir.path());
        assert_eq!(reader.apply().unwrap(), 3);

        let page = catalog.find_page("vol-1", "0000001.000").unwrap().unwrap();
        assert_eq!((page.width, page.height), (Some(30), Some(40)));
        assert_eq!(page.color_type, PageColor::Color);

        let page = catalog.find_page("vol-1", "0000002.000").unwrap().unwrap();
        assert_eq!((page.width, page.height), (Some(50), Some(60)));
        assert_eq!(page.color_type, PageColor::BW);

        let page = catalog.find_page("vol-1", "0000003.000").unwrap().unwrap();
        assert_eq!(page.color_type, PageColor::Greyscale);
    }

    #[test]
    fn test_missing_image_is_reported() {
        let dir = TempDir::new().unwrap();
        write_grey(&dir.path().join("0000001.000"), 10, 20);

        let catalog = catalog_with_pages(&["0000001.000", "0000002.000"]);
        let reader = ImageMetadataReader::new(&catalog, "vol-1", dir.path());

        match reader.apply() {
            Err(ImageError::MissingImage { page, .. }) => assert_eq!(page, "0000002.000"),
            other => panic!("expected MissingImage, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_directory() {
        let catalog = catalog_with_pages(&["0000001.000"]);
        let reader = ImageMetadataReader::new(&catalog, "vol-1", Path::new("/nonexistent/600"));
        assert!(matches!(
            reader.apply(),
            Err(ImageError::ListDirectory { .. })
        ));
    }
}
