use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use illu_core::ports::DerivativeStorePort;
use illu_core::{ArtifactKey, StorageError, StoreLayout};
use tracing::{debug, debug_span};

const TMP_SUFFIX: &str = "tmp";

/// Local filesystem store for derived images.
///
/// Files live at
/// `<root>/<illustration_directory>/<collection>/<attribute>[/<width>w]/<stem>.<ext>`.
pub struct FsDerivativeStore {
    layout: StoreLayout,
}

impl FsDerivativeStore {
    /// Create a store that resolves every path and URL through `layout`.
    ///
    /// # Examples
    ///
    /// ```
    /// use illu_core::{ArtifactKey, StoreLayout};
    /// use illu_core::ports::DerivativeStorePort;
    /// use illu_infra::FsDerivativeStore;
    ///
    /// let store = FsDerivativeStore::new(StoreLayout::new("/srv/www", "/", "product"));
    /// let key = ArtifactKey::new("cover", Some(240), "abc123.jpg");
    /// assert_eq!(store.url_of(&key), "/illustrations/product/cover/240w/abc123.jpg");
    /// ```
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

/// Fill `tmp_path` with `fill` and rename it to `path`. The temp file never
/// outlives a failure.
fn persist_via_tmp(
    tmp_path: &Path,
    path: PathBuf,
    fill: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<PathBuf, StorageError> {
    if let Err(source) = fill(tmp_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(StorageError::Write {
            path: tmp_path.to_path_buf(),
            source,
        });
    }
    if let Err(source) = fs::rename(tmp_path, &path) {
        let _ = fs::remove_file(tmp_path);
        return Err(StorageError::Write { path, source });
    }
    Ok(path)
}

impl DerivativeStorePort for FsDerivativeStore {
    /// Write through a sibling temp file and rename it into place, so a
    /// reader never sees a half-written derivative.
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.layout.path_for(key);
        let span = debug_span!(
            "infra.fs.write_derivative",
            path = %path.display(),
            size = bytes.len()
        );
        let _enter = span.enter();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let tmp_path = tmp_path_for(&path);
        let path = persist_via_tmp(&tmp_path, path, |tmp| fs::write(tmp, bytes))?;

        debug!("Derivative written");
        Ok(path)
    }

    fn delete(&self, key: &ArtifactKey) -> Result<bool, StorageError> {
        let path = self.layout.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Derivative deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Delete { path, source }),
        }
    }

    fn exists(&self, key: &ArtifactKey) -> bool {
        self.layout.path_for(key).is_file()
    }

    fn path_of(&self, key: &ArtifactKey) -> PathBuf {
        self.layout.path_for(key)
    }

    fn url_of(&self, key: &ArtifactKey) -> String {
        self.layout.url_for(key)
    }
}
