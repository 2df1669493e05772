use std::path::{Component, Path, PathBuf};

use log::debug;

use super::{ObjectStore, ObjectUpload};
use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (atomic on the same
/// filesystem) and falls back to copy + delete.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Object store that mirrors keys into a local bucket directory.
pub struct FilesystemObjectStore {
    bucket_directory: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new<P: AsRef<Path>>(bucket_directory: P) -> Self {
        Self {
            bucket_directory: bucket_directory.as_ref().to_path_buf(),
        }
    }

    pub fn bucket_directory(&self) -> &Path {
        &self.bucket_directory
    }

    /// Resolves a key inside the bucket. Absolute keys and `..` are rejected.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.bucket_directory.join(relative))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl ObjectStore for FilesystemObjectStore {
    /// Copies to a temporary sibling, then renames into place, so readers
    /// never see a partial object. Existing objects are overwritten.
    fn put(&self, upload: &ObjectUpload) -> Result<(), StorageError> {
        let target = self.path_for(&upload.key)?;
        if let Some(parent) = target.parent() {
            self.ensure_directory(parent)?;
        }

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StorageError::InvalidKey(upload.key.clone()))?;
        let staging = target.with_file_name(format!(".{}.partial", file_name));

        std::fs::copy(&upload.source, &staging).map_err(|e| StorageError::CopyFile {
            from: upload.source.clone(),
            to: staging.clone(),
            source: e,
        })?;
        move_file(&staging, &target)?;

        debug!("Stored {} as {}", upload.source.display(), upload.key);
        Ok(())
    }
}
