//! Readers for per-page source files: image headers and OCR text.

pub mod image;
pub mod ocr;

pub use self::image::{list_image_files, read_header, ImageFile, ImageHeader, ImageMetadataReader};
pub use ocr::{decode_entities, OcrTextReader};
