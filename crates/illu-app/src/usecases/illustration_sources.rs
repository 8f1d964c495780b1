use std::path::PathBuf;
use std::sync::Arc;

use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort};
use illu_core::{DerivedArtifactSet, IllustrationConfig, IllustrationError, RecordId};

/// Read side: URLs and paths of the stored derivatives of a record.
///
/// Step `0` is the largest level, higher steps are smaller and negative steps
/// count from the smallest (`-1`). Steps outside the range wrap around.
pub struct IllustrationSources {
    config: Arc<IllustrationConfig>,
    records: Arc<dyn IllustrationRecordPort>,
    store: Arc<dyn DerivativeStorePort>,
}

impl IllustrationSources {
    pub fn from_ports(
        config: Arc<IllustrationConfig>,
        records: Arc<dyn IllustrationRecordPort>,
        store: Arc<dyn DerivativeStorePort>,
    ) -> Self {
        Self {
            config,
            records,
            store,
        }
    }

    fn current_set(
        &self,
        record: &RecordId,
        attribute: &str,
    ) -> Result<Option<DerivedArtifactSet>, IllustrationError> {
        let config = self.config.attribute(attribute)?;
        let file_name = self.records.current_file_name(record, attribute)?;
        Ok(file_name.map(|name| DerivedArtifactSet::new(attribute, name, config)))
    }

    /// URL of one level, `None` when nothing is stored.
    pub fn src(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<Option<String>, IllustrationError> {
        Ok(self
            .current_set(record, attribute)?
            .map(|set| self.store.url_of(&set.key_for_step(step))))
    }

    /// Every level as `(url, nominal width)`, largest first.
    pub fn src_set(
        &self,
        record: &RecordId,
        attribute: &str,
    ) -> Result<Vec<(String, Option<u32>)>, IllustrationError> {
        let Some(set) = self.current_set(record, attribute)? else {
            return Ok(Vec::new());
        };
        Ok(set
            .keys()
            .iter()
            .map(|key| (self.store.url_of(key), key.width))
            .collect())
    }

    pub fn path(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<Option<PathBuf>, IllustrationError> {
        Ok(self
            .current_set(record, attribute)?
            .map(|set| self.store.path_of(&set.key_for_step(step))))
    }

    /// URL of the smallest level at least `size` pixels wide.
    pub fn src_for_size(
        &self,
        record: &RecordId,
        attribute: &str,
        size: u32,
    ) -> Result<Option<String>, IllustrationError> {
        Ok(self
            .current_set(record, attribute)?
            .map(|set| self.store.url_of(&set.key_for_size(size))))
    }

    /// Aspect ratio of the stored set: the per-record value when the
    /// attribute keeps one, else the fixed ratio. `None` for a blank
    /// attribute or when neither is configured.
    pub fn aspect(
        &self,
        record: &RecordId,
        attribute: &str,
    ) -> Result<Option<f64>, IllustrationError> {
        let config = self.config.attribute(attribute)?;
        if self.records.current_file_name(record, attribute)?.is_none() {
            return Ok(None);
        }
        match config.aspect_attribute.as_deref() {
            Some(field) => Ok(self.records.current_aspect(record, field)?),
            None => Ok(config.aspect_ratio),
        }
    }

    /// Like [`src`](Self::src), but yields the configured no-image URL for a
    /// blank attribute.
    pub fn src_or_placeholder(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<String, IllustrationError> {
        Ok(self
            .src(record, attribute, step)?
            .unwrap_or_else(|| self.config.no_image.clone()))
    }
}
