use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use illu_core::ports::IllustrationRecordPort;
use illu_core::RecordId;

type Key = (RecordId, String);

#[derive(Default)]
struct Fields {
    names: BTreeMap<Key, String>,
    aspects: BTreeMap<Key, f64>,
}

/// Process-local record store, for tests and embedding without a database.
#[derive(Default)]
pub struct InMemoryRecordStore {
    fields: Mutex<Fields>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Fields>> {
        self.fields
            .lock()
            .map_err(|_| anyhow!("record store lock poisoned"))
    }

    /// Number of non-blank file names across all records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.names.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn key(record: &RecordId, field: &str) -> Key {
    (record.clone(), field.to_string())
}

impl IllustrationRecordPort for InMemoryRecordStore {
    fn current_file_name(&self, record: &RecordId, attribute: &str) -> Result<Option<String>> {
        Ok(self.lock()?.names.get(&key(record, attribute)).cloned())
    }

    fn set_file_name(
        &self,
        record: &RecordId,
        attribute: &str,
        file_name: Option<&str>,
    ) -> Result<()> {
        let mut fields = self.lock()?;
        match file_name {
            Some(name) => {
                fields.names.insert(key(record, attribute), name.to_string());
            }
            None => {
                fields.names.remove(&key(record, attribute));
            }
        }
        Ok(())
    }

    fn exists_with_prefix(&self, attribute: &str, prefix: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .names
            .iter()
            .any(|((_, attr), name)| attr == attribute && name.starts_with(prefix)))
    }

    fn current_aspect(&self, record: &RecordId, field: &str) -> Result<Option<f64>> {
        Ok(self.lock()?.aspects.get(&key(record, field)).copied())
    }

    fn set_aspect(&self, record: &RecordId, field: &str, aspect: Option<f64>) -> Result<()> {
        let mut fields = self.lock()?;
        match aspect {
            Some(aspect) => {
                fields.aspects.insert(key(record, field), aspect);
            }
            None => {
                fields.aspects.remove(&key(record, field));
            }
        }
        Ok(())
    }
}
