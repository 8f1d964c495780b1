use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use illu_app::{
    AttributeInput, DeleteIllustrations, IllustrationSources, SaveIllustrations, SaveReport,
};
use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort, ImagePipelinePort};
use illu_core::{IllustrationConfig, IllustrationError, RecordId};

use crate::bootstrap::config::IllustratedConfig;
use crate::bootstrap::wiring::build_adapters;

/// Illustration handling for the records of one owner collection.
///
/// Cheap to share between threads; saves of the same record must not run
/// concurrently.
pub struct Illustrated {
    config: Arc<IllustrationConfig>,
    save: SaveIllustrations,
    delete: DeleteIllustrations,
    sources: IllustrationSources,
}

impl Illustrated {
    /// Wire the default adapters for records of type `owner_type`.
    pub fn build(settings: &IllustratedConfig, owner_type: &str) -> anyhow::Result<Self> {
        let config = settings
            .to_illustration_config(owner_type)
            .with_context(|| format!("Invalid illustration config for {}", owner_type))?;
        let adapters = build_adapters(&config, settings.database_url.as_deref())?;
        Ok(Self::from_ports(
            config,
            adapters.records,
            adapters.store,
            adapters.pipeline,
        ))
    }

    pub fn from_ports(
        config: IllustrationConfig,
        records: Arc<dyn IllustrationRecordPort>,
        store: Arc<dyn DerivativeStorePort>,
        pipeline: Arc<dyn ImagePipelinePort>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            save: SaveIllustrations::from_ports(
                config.clone(),
                records.clone(),
                store.clone(),
                pipeline,
            ),
            delete: DeleteIllustrations::from_ports(config.clone(), records.clone(), store.clone()),
            sources: IllustrationSources::from_ports(config.clone(), records, store),
            config,
        }
    }

    pub fn config(&self) -> &IllustrationConfig {
        &self.config
    }

    /// Call after the record itself was saved.
    pub fn save(
        &self,
        record: &RecordId,
        submission: &BTreeMap<String, AttributeInput>,
    ) -> SaveReport {
        self.save.execute(record, submission)
    }

    /// Call after the record itself was deleted. Returns the number of files
    /// removed.
    pub fn delete(&self, record: &RecordId) -> Result<usize, IllustrationError> {
        self.delete.execute(record)
    }

    pub fn src(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<Option<String>, IllustrationError> {
        self.sources.src(record, attribute, step)
    }

    pub fn src_set(
        &self,
        record: &RecordId,
        attribute: &str,
    ) -> Result<Vec<(String, Option<u32>)>, IllustrationError> {
        self.sources.src_set(record, attribute)
    }

    pub fn path(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<Option<PathBuf>, IllustrationError> {
        self.sources.path(record, attribute, step)
    }

    pub fn src_for_size(
        &self,
        record: &RecordId,
        attribute: &str,
        size: u32,
    ) -> Result<Option<String>, IllustrationError> {
        self.sources.src_for_size(record, attribute, size)
    }

    /// Aspect ratio the stored set was derived with, when known.
    pub fn aspect(
        &self,
        record: &RecordId,
        attribute: &str,
    ) -> Result<Option<f64>, IllustrationError> {
        self.sources.aspect(record, attribute)
    }

    pub fn src_or_placeholder(
        &self,
        record: &RecordId,
        attribute: &str,
        step: i32,
    ) -> Result<String, IllustrationError> {
        self.sources.src_or_placeholder(record, attribute, step)
    }
}
