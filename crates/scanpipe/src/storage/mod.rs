//! Object storage for page images.

pub mod filesystem;

use std::path::PathBuf;

use crate::catalog::model::JournalVolume;
use crate::error::StorageError;

pub use filesystem::FilesystemObjectStore;

/// One page image to place in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    pub page_name: String,
    pub key: String,
    pub source: PathBuf,
}

/// `bitmaps/{type}/{journal with '.' → '_'}/{volume}/600/{filename}`
pub fn object_key(volume: &JournalVolume, filename: &str) -> String {
    format!(
        "bitmaps/{}/{}/{}/600/{}",
        volume.kind,
        volume.bucket_journal(),
        volume.volume,
        filename
    )
}

pub trait ObjectStore: Send + Sync {
    fn put(&self, upload: &ObjectUpload) -> Result<(), StorageError>;

    /// Uploads a volume's page-to-file mapping, stopping at the first failure.
    fn put_all(&self, uploads: &[ObjectUpload]) -> Result<usize, StorageError> {
        for upload in uploads {
            self.put(upload)?;
        }
        Ok(uploads.len())
    }
}
