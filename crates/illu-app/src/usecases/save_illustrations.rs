use std::collections::BTreeMap;
use std::sync::Arc;

use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort, ImagePipelinePort};
use illu_core::{
    ArtifactKey, ArtifactName, AttributeConfig, CropInstruction, DerivedArtifactSet,
    IllustrationConfig, IllustrationError, RecordId, StemAllocator, Upload,
};
use tracing::{debug, info, warn};

/// What the form submitted for one attribute.
#[derive(Debug, Clone, Default)]
pub struct AttributeInput {
    pub upload: Option<Upload>,
    pub crop: CropInstruction,
    /// The "delete image" checkbox.
    pub delete: bool,
}

impl AttributeInput {
    pub fn upload(upload: Upload, crop: CropInstruction) -> Self {
        Self {
            upload: Some(upload),
            crop,
            delete: false,
        }
    }

    pub fn delete() -> Self {
        Self {
            upload: None,
            crop: CropInstruction::default(),
            delete: true,
        }
    }
}

/// Result of one attribute within a save.
#[derive(Debug)]
pub enum AttributeOutcome {
    /// Nothing submitted; the stored name was left alone.
    Untouched,
    /// A new set was written and recorded.
    Committed {
        file_name: String,
        replaced: Option<String>,
    },
    /// The delete flag blanked the attribute.
    Cleared { previous: Option<String> },
    /// The upload failed validation; nothing was written.
    Rejected(IllustrationError),
    /// Storage, naming or the record store failed; the stored name is unchanged.
    Failed(IllustrationError),
}

impl AttributeOutcome {
    pub fn error(&self) -> Option<&IllustrationError> {
        match self {
            Self::Rejected(e) | Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    fn from_error(err: IllustrationError) -> Self {
        if err.is_validation() {
            Self::Rejected(err)
        } else {
            Self::Failed(err)
        }
    }
}

/// Outcome of every attribute touched by one save, keyed by attribute name.
#[derive(Debug, Default)]
pub struct SaveReport {
    outcomes: BTreeMap<String, AttributeOutcome>,
}

impl SaveReport {
    pub fn outcome(&self, attribute: &str) -> Option<&AttributeOutcome> {
        self.outcomes.get(attribute)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &AttributeOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `true` when no attribute was rejected or failed.
    pub fn is_valid(&self) -> bool {
        self.outcomes.values().all(|o| o.error().is_none())
    }

    /// `(attribute, message)` for every rejected or failed attribute.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter_map(|(attr, o)| o.error().map(|e| (attr.clone(), e.to_string())))
            .collect()
    }

    pub fn into_outcomes(self) -> BTreeMap<String, AttributeOutcome> {
        self.outcomes
    }
}

/// Derives, stores and records the image of every submitted attribute.
///
/// Per attribute: validate, write every level under a fresh stem, record the
/// new name, then remove the previous set. A failure before the record is
/// updated removes whatever was already written and leaves the old set
/// current.
///
/// 保存记录时为每个插图属性生成派生图像并更新记录。
pub struct SaveIllustrations {
    config: Arc<IllustrationConfig>,
    records: Arc<dyn IllustrationRecordPort>,
    store: Arc<dyn DerivativeStorePort>,
    pipeline: Arc<dyn ImagePipelinePort>,
    allocator: StemAllocator,
}

impl SaveIllustrations {
    pub fn from_ports(
        config: Arc<IllustrationConfig>,
        records: Arc<dyn IllustrationRecordPort>,
        store: Arc<dyn DerivativeStorePort>,
        pipeline: Arc<dyn ImagePipelinePort>,
    ) -> Self {
        Self {
            config,
            records,
            store,
            pipeline,
            allocator: StemAllocator::default(),
        }
    }

    pub fn with_allocator(mut self, allocator: StemAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Process every configured attribute of `record`.
    ///
    /// Attributes missing from `submission` are reported as untouched;
    /// submitted names that are not configured are rejected.
    #[tracing::instrument(
        name = "usecase.save_illustrations.execute",
        skip(self, submission),
        fields(record = %record, attributes = submission.len())
    )]
    pub fn execute(
        &self,
        record: &RecordId,
        submission: &BTreeMap<String, AttributeInput>,
    ) -> SaveReport {
        let mut report = SaveReport::default();

        for (attribute, config) in self.config.attributes() {
            let outcome = match submission.get(attribute) {
                Some(input) => self
                    .save_attribute(record, attribute, config, input)
                    .unwrap_or_else(AttributeOutcome::from_error),
                None => AttributeOutcome::Untouched,
            };
            if let Some(err) = outcome.error() {
                warn!(attribute, error = %err, "Illustration not saved");
            }
            report.outcomes.insert(attribute.to_string(), outcome);
        }

        for attribute in submission.keys() {
            if !report.outcomes.contains_key(attribute) {
                report.outcomes.insert(
                    attribute.clone(),
                    AttributeOutcome::Failed(IllustrationError::UnknownAttribute(
                        attribute.clone(),
                    )),
                );
            }
        }

        report
    }

    fn save_attribute(
        &self,
        record: &RecordId,
        attribute: &str,
        config: &AttributeConfig,
        input: &AttributeInput,
    ) -> Result<AttributeOutcome, IllustrationError> {
        match &input.upload {
            Some(upload) => self.replace(record, attribute, config, upload, &input.crop),
            None if input.delete => self.clear(record, attribute, config),
            None => Ok(AttributeOutcome::Untouched),
        }
    }

    fn replace(
        &self,
        record: &RecordId,
        attribute: &str,
        config: &AttributeConfig,
        upload: &Upload,
        crop: &CropInstruction,
    ) -> Result<AttributeOutcome, IllustrationError> {
        let previous = self.records.current_file_name(record, attribute)?;
        let crop = self.with_stored_aspect(record, config, crop)?;
        let prepared = self.pipeline.prepare(upload, &crop, config)?;

        let stem = self
            .allocator
            .allocate(|candidate| self.records.exists_with_prefix(attribute, candidate))?;
        let file_name = ArtifactName::new(stem, prepared.output).to_string();
        debug!(attribute, file_name = %file_name, "Allocated file name");

        let mut written = Vec::new();
        for level in prepared.levels {
            let stored = level.and_then(|level| {
                let key = ArtifactKey::new(attribute, level.width, &file_name);
                self.store.write(&key, &level.bytes)?;
                Ok(key)
            });
            match stored {
                Ok(key) => written.push(key),
                Err(err) => {
                    self.roll_back(&written);
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.record_commit(
            record,
            attribute,
            config,
            &file_name,
            prepared.aspect,
            previous.as_deref(),
        ) {
            self.roll_back(&written);
            return Err(err);
        }

        if let Some(old) = previous.as_deref().filter(|old| *old != file_name) {
            self.remove_set(attribute, old, config);
        }

        info!(
            attribute,
            file_name = %file_name,
            levels = written.len(),
            replaced = previous.as_deref().unwrap_or(""),
            "Illustration committed"
        );
        Ok(AttributeOutcome::Committed {
            file_name,
            replaced: previous,
        })
    }

    fn clear(
        &self,
        record: &RecordId,
        attribute: &str,
        config: &AttributeConfig,
    ) -> Result<AttributeOutcome, IllustrationError> {
        let previous = self.records.current_file_name(record, attribute)?;
        if let Some(old) = previous.as_deref() {
            self.records.set_file_name(record, attribute, None)?;
            if let Some(field) = config.aspect_attribute.as_deref() {
                self.records.set_aspect(record, field, None)?;
            }
            self.remove_set(attribute, old, config);
            info!(attribute, file_name = old, "Illustration cleared");
        }
        Ok(AttributeOutcome::Cleared { previous })
    }

    // A crop without its own aspect reuses the one stored on the record.
    fn with_stored_aspect(
        &self,
        record: &RecordId,
        config: &AttributeConfig,
        crop: &CropInstruction,
    ) -> Result<CropInstruction, IllustrationError> {
        let mut crop = *crop;
        if crop.aspect == 0.0 {
            if let Some(field) = config.aspect_attribute.as_deref() {
                if let Some(stored) = self.records.current_aspect(record, field)? {
                    crop.aspect = stored;
                }
            }
        }
        Ok(crop)
    }

    /// Point the record at the new set. If the aspect cannot be stored the
    /// previous file name is put back.
    fn record_commit(
        &self,
        record: &RecordId,
        attribute: &str,
        config: &AttributeConfig,
        file_name: &str,
        aspect: f64,
        previous: Option<&str>,
    ) -> Result<(), IllustrationError> {
        self.records.set_file_name(record, attribute, Some(file_name))?;
        let Some(field) = config.aspect_attribute.as_deref() else {
            return Ok(());
        };
        if let Err(err) = self.records.set_aspect(record, field, Some(aspect)) {
            if let Err(restore) = self.records.set_file_name(record, attribute, previous) {
                warn!(attribute, error = %restore, "Previous file name not restored");
            }
            return Err(err.into());
        }
        debug!(attribute, field, aspect, "Stored aspect ratio");
        Ok(())
    }

    fn roll_back(&self, written: &[ArtifactKey]) {
        for key in written.iter().rev() {
            if let Err(err) = self.store.delete(key) {
                warn!(error = %err, "Rollback could not remove derivative");
            }
        }
    }

    // The record no longer points at this set; a leftover file is only an orphan.
    fn remove_set(&self, attribute: &str, file_name: &str, config: &AttributeConfig) {
        let set = DerivedArtifactSet::new(attribute, file_name, config);
        if let Err(err) = self.store.remove(&set) {
            warn!(attribute, file_name, error = %err, "Previous derivatives not removed");
        }
    }
}
