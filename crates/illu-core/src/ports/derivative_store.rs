use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StorageError;
use crate::layout::{ArtifactKey, DerivedArtifactSet};

/// Storage of derived image files under the size-stepped layout.
///
/// 按尺寸分级目录存放派生图像文件。
pub trait DerivativeStorePort: Send + Sync {
    /// Write one level, creating its directory first. Returns the file path.
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf, StorageError>;

    /// Delete one file. A missing file is not an error; returns whether a
    /// file was actually removed.
    fn delete(&self, key: &ArtifactKey) -> Result<bool, StorageError>;

    fn exists(&self, key: &ArtifactKey) -> bool;

    fn path_of(&self, key: &ArtifactKey) -> PathBuf;

    fn url_of(&self, key: &ArtifactKey) -> String;

    /// Delete every file of `set`. Idempotent.
    fn remove(&self, set: &DerivedArtifactSet) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in set.keys() {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<T: DerivativeStorePort + ?Sized> DerivativeStorePort for Arc<T> {
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        (**self).write(key, bytes)
    }

    fn delete(&self, key: &ArtifactKey) -> Result<bool, StorageError> {
        (**self).delete(key)
    }

    fn exists(&self, key: &ArtifactKey) -> bool {
        (**self).exists(key)
    }

    fn path_of(&self, key: &ArtifactKey) -> PathBuf {
        (**self).path_of(key)
    }

    fn url_of(&self, key: &ArtifactKey) -> String {
        (**self).url_of(key)
    }
}
