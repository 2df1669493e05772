//! Volume fingerprints for change detection.

use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::FingerprintError;
use crate::layout::VolumeSources;

/// Folds (file name, modification time) pairs into a running SHA-256 digest.
#[derive(Debug, Default)]
pub struct Fingerprint {
    digest: String,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// `digest = hex(sha256(previous digest || name || 0x00 || mtime nanos))`
    pub fn update(&mut self, name: &str, modified_nanos: u128) {
        let mut hasher = Sha256::new();
        hasher.update(self.digest.as_bytes());
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(modified_nanos.to_string().as_bytes());
        self.digest = hex::encode(hasher.finalize());
    }

    pub fn finish(self) -> String {
        self.digest
    }
}

fn modified_nanos(path: &Path) -> Result<u128, FingerprintError> {
    let metadata_error = |source| FingerprintError::Metadata {
        path: path.to_path_buf(),
        source,
    };

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(metadata_error)?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| metadata_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok(since_epoch.as_nanos())
}

/// Folds the files of one directory, sorted by name, into `fingerprint`.
fn fold_directory<F>(
    fingerprint: &mut Fingerprint,
    directory: &Path,
    include: F,
) -> Result<(), FingerprintError>
where
    F: Fn(&str) -> bool,
{
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| FingerprintError::Walk {
            path: directory.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !include(&name) {
            continue;
        }
        fingerprint.update(&name, modified_nanos(entry.path())?);
    }
    Ok(())
}

/// Fingerprints a volume's sources: its list files, then its images, then
/// its OCR texts. A volume without an OCR directory hashes the first two only.
pub fn fingerprint_volume(sources: &VolumeSources) -> Result<String, FingerprintError> {
    let mut fingerprint = Fingerprint::new();

    fold_directory(&mut fingerprint, &sources.list_dir, |name| {
        sources.owns_list_file(name)
    })?;
    fold_directory(&mut fingerprint, &sources.image_dir, |_| true)?;
    if sources.ocr_dir.is_dir() {
        fold_directory(&mut fingerprint, &sources.ocr_dir, |_| true)?;
    }

    Ok(fingerprint.finish())
}
