use std::sync::Arc;

use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort};
use illu_core::{
    AttributeConfig, DerivedArtifactSet, IllustrationConfig, IllustrationError, RecordId,
};
use tracing::{info, warn};

/// Removes every derived set of a record that is being deleted.
///
/// 删除记录时清理其所有插图属性的派生文件。
pub struct DeleteIllustrations {
    config: Arc<IllustrationConfig>,
    records: Arc<dyn IllustrationRecordPort>,
    store: Arc<dyn DerivativeStorePort>,
}

impl DeleteIllustrations {
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

    /// Delete the files of every configured attribute and blank the stored
    /// names and per-record aspect ratios.
    ///
    /// Every attribute is attempted even if an earlier one fails; the first
    /// failure is returned. Running it again on a cleared record is a no-op.
    ///
    /// Returns the number of files removed.
    #[tracing::instrument(
        name = "usecase.delete_illustrations.execute",
        skip(self),
        fields(record = %record)
    )]
    pub fn execute(&self, record: &RecordId) -> Result<usize, IllustrationError> {
        let mut removed = 0;
        let mut first_error = None;

        for (attribute, config) in self.config.attributes() {
            let result = self.delete_attribute(record, attribute, config);
            match result {
                Ok(count) => removed += count,
                Err(err) => {
                    warn!(attribute, error = %err, "Failed to delete illustration");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!(removed, "Deleted illustrations");
                Ok(removed)
            }
        }
    }

    fn delete_attribute(
        &self,
        record: &RecordId,
        attribute: &str,
        config: &AttributeConfig,
    ) -> Result<usize, IllustrationError> {
        let Some(file_name) = self.records.current_file_name(record, attribute)? else {
            return Ok(0);
        };
        let set = DerivedArtifactSet::new(attribute, file_name, config);
        let removed = self.store.remove(&set)?;
        self.records.set_file_name(record, attribute, None)?;
        if let Some(field) = config.aspect_attribute.as_deref() {
            self.records.set_aspect(record, field, None)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use illu_core::{ArtifactKey, StorageError, StoreLayout};
    use mockall::mock;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    mock! {
        Store {}
        impl DerivativeStorePort for Store {
            fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf, StorageError>;
            fn delete(&self, key: &ArtifactKey) -> Result<bool, StorageError>;
            fn exists(&self, key: &ArtifactKey) -> bool;
            fn path_of(&self, key: &ArtifactKey) -> PathBuf;
            fn url_of(&self, key: &ArtifactKey) -> String;
        }
    }

    // Record store keyed by attribute; `broken` attributes fail to load.
    #[derive(Default)]
    struct FakeRecords {
        names: Mutex<BTreeMap<String, String>>,
        aspects: Mutex<BTreeMap<String, f64>>,
        broken: Vec<&'static str>,
    }

    impl FakeRecords {
        fn with(names: &[(&str, &str)]) -> Self {
            Self {
                names: Mutex::new(
                    names
                        .iter()
                        .map(|(a, n)| (a.to_string(), n.to_string()))
                        .collect(),
                ),
                ..Default::default()
            }
        }
    }

    impl IllustrationRecordPort for FakeRecords {
        fn current_file_name(
            &self,
            _record: &RecordId,
            attribute: &str,
        ) -> anyhow::Result<Option<String>> {
            if self.broken.iter().any(|b| *b == attribute) {
                return Err(anyhow::anyhow!("db locked"));
            }
            Ok(self.names.lock().unwrap().get(attribute).cloned())
        }

        fn set_file_name(
            &self,
            _record: &RecordId,
            attribute: &str,
            file_name: Option<&str>,
        ) -> anyhow::Result<()> {
            let mut names = self.names.lock().unwrap();
            match file_name {
                Some(name) => names.insert(attribute.to_string(), name.to_string()),
                None => names.remove(attribute),
            };
            Ok(())
        }

        fn exists_with_prefix(&self, _attribute: &str, _prefix: &str) -> anyhow::Result<bool> {
            Ok(false)
        }

        fn current_aspect(&self, _record: &RecordId, field: &str) -> anyhow::Result<Option<f64>> {
            Ok(self.aspects.lock().unwrap().get(field).copied())
        }

        fn set_aspect(
            &self,
            _record: &RecordId,
            field: &str,
            aspect: Option<f64>,
        ) -> anyhow::Result<()> {
            let mut aspects = self.aspects.lock().unwrap();
            match aspect {
                Some(aspect) => aspects.insert(field.to_string(), aspect),
                None => aspects.remove(field),
            };
            Ok(())
        }
    }

    fn config() -> Arc<IllustrationConfig> {
        Arc::new(
            IllustrationConfig::new(StoreLayout::new("/srv", "/", "product"))
                .with_attribute("cover", AttributeConfig::with_crop_width(240).crop_steps(2))
                .with_attribute(
                    "thumb",
                    AttributeConfig::with_crop_width(64).aspect_attribute("thumb_aspect"),
                ),
        )
    }

    #[test]
    fn removes_every_level_and_blanks_names() {
        let records = Arc::new(FakeRecords::with(&[("cover", "abc123.png")]));
        let mut store = MockStore::new();
        store
            .expect_delete()
            .withf(|key| key.file_name == "abc123.png" && key.attribute == "cover")
            .times(2)
            .returning(|_| Ok(true));

        let uc = DeleteIllustrations::from_ports(config(), records.clone(), Arc::new(store));

        assert_eq!(uc.execute(&RecordId::from("1")).unwrap(), 2);
        assert!(records.names.lock().unwrap().is_empty());
    }

    #[test]
    fn blanks_stored_aspect_with_the_name() {
        let records = Arc::new(FakeRecords::with(&[("thumb", "zzz999.jpg")]));
        records
            .aspects
            .lock()
            .unwrap()
            .insert("thumb_aspect".to_string(), 0.75);
        let mut store = MockStore::new();
        store.expect_delete().times(1).returning(|_| Ok(true));

        let uc = DeleteIllustrations::from_ports(config(), records.clone(), Arc::new(store));

        assert_eq!(uc.execute(&RecordId::from("1")).unwrap(), 1);
        assert!(records.names.lock().unwrap().is_empty());
        assert!(records.aspects.lock().unwrap().is_empty());
    }

    #[test]
    fn continues_after_failure_and_returns_first_error() {
        let records = Arc::new(FakeRecords {
            broken: vec!["cover"],
            ..FakeRecords::with(&[("thumb", "zzz999.jpg")])
        });
        let mut store = MockStore::new();
        store
            .expect_delete()
            .withf(|key| key.width.is_none() && key.file_name == "zzz999.jpg")
            .times(1)
            .returning(|_| Ok(true));

        let uc = DeleteIllustrations::from_ports(config(), records.clone(), Arc::new(store));
        let err = uc.execute(&RecordId::from("1")).unwrap_err();

        assert!(matches!(err, IllustrationError::Record(_)));
        assert!(records.names.lock().unwrap().is_empty());
    }

    #[test]
    fn blank_record_is_a_no_op() {
        let mut store = MockStore::new();
        store.expect_delete().never();

        let uc = DeleteIllustrations::from_ports(
            config(),
            Arc::new(FakeRecords::default()),
            Arc::new(store),
        );

        assert_eq!(uc.execute(&RecordId::from("1")).unwrap(), 0);
    }

    #[test]
    fn storage_failure_keeps_stored_name() {
        let records = Arc::new(FakeRecords::with(&[("thumb", "zzz999.jpg")]));
        let mut store = MockStore::new();
        store.expect_delete().returning(|_| {
            Err(StorageError::Delete {
                path: PathBuf::from("thumb/zzz999.jpg"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        });

        let uc = DeleteIllustrations::from_ports(config(), records.clone(), Arc::new(store));
        let err = uc.execute(&RecordId::from("1")).unwrap_err();

        assert!(matches!(err, IllustrationError::Storage(_)));
        assert_eq!(
            records.names.lock().unwrap().get("thumb").map(String::as_str),
            Some("zzz999.jpg")
        );
    }
}
