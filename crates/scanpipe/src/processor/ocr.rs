use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::{Captures, Regex};

use crate::error::PublishError;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("Invalid regex")
});

/// Decodes HTML named and numeric character references.
///
/// References that do not resolve, and bare ampersands, are left as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let reference = &caps[0];
        match unescape_with(reference, resolve_html5_entity) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => reference.to_string(),
        }
    })
}

/// Reads per-page OCR bodies from a volume's OCR directory.
pub struct OcrTextReader {
    directory: PathBuf,
}

impl OcrTextReader {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
        }
    }

    pub fn path_for(&self, page_name: &str) -> PathBuf {
        self.directory.join(format!("{}.txt", page_name))
    }

    /// Returns the decoded text of a page, or an empty string when the page
    /// has no OCR file.
    pub fn read(&self, page_name: &str) -> Result<String, PublishError> {
        let path = self.path_for(page_name);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No OCR text for page {}", page_name);
                return Ok(String::new());
            }
            Err(e) => return Err(PublishError::OcrText { path, source: e }),
        };

        let text = String::from_utf8_lossy(&bytes);
        Ok(decode_entities(&text).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("caf&eacute;"), "café");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("plain text"), "plain text");
    }

    #[test]
    fn test_unresolved_references_are_kept() {
        assert_eq!(decode_entities("A & B"), "A & B");
        assert_eq!(decode_entities("&bogus; x"), "&bogus; x");
        assert_eq!(decode_entities("AT&T"), "AT&T");
    }

    #[test]
    fn test_read_decodes_text() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("0000001.000.txt"), "Fish &amp; chips").unwrap();

        let reader = OcrTextReader::new(dir.path());
        assert_eq!(reader.read("0000001.000").unwrap(), "Fish & chips");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let reader = OcrTextReader::new(dir.path());
        assert_eq!(reader.read("0000002.000").unwrap(), "");

        let reader = OcrTextReader::new(Path::new("/nonexistent/ocr"));
        assert_eq!(reader.read("0000002.000").unwrap(), "");
    }
}
