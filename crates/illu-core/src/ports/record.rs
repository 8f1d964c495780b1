use anyhow::Result;
use std::sync::Arc;

use crate::ids::RecordId;

/// Access to the file names stored on owning records.
///
/// 访问拥有记录上保存的派生文件名。
pub trait IllustrationRecordPort: Send + Sync {
    /// Current `<stem>.<ext>` of the attribute, `None` when blank.
    fn current_file_name(&self, record: &RecordId, attribute: &str) -> Result<Option<String>>;

    /// Store or blank (`None`) the attribute's file name.
    fn set_file_name(&self, record: &RecordId, attribute: &str, file_name: Option<&str>)
        -> Result<()>;

    /// Whether any record of the collection stores a file name for
    /// `attribute` that starts with `prefix`.
    fn exists_with_prefix(&self, attribute: &str, prefix: &str) -> Result<bool>;

    /// Per-record aspect ratio kept in `field`, `None` when blank.
    fn current_aspect(&self, record: &RecordId, field: &str) -> Result<Option<f64>>;

    /// Store or blank (`None`) the per-record aspect ratio in `field`.
    fn set_aspect(&self, record: &RecordId, field: &str, aspect: Option<f64>) -> Result<()>;
}

impl<T: IllustrationRecordPort + ?Sized> IllustrationRecordPort for Arc<T> {
    fn current_file_name(&self, record: &RecordId, attribute: &str) -> Result<Option<String>> {
        (**self).current_file_name(record, attribute)
    }

    fn set_file_name(
        &self,
        record: &RecordId,
        attribute: &str,
        file_name: Option<&str>,
    ) -> Result<()> {
        (**self).set_file_name(record, attribute, file_name)
    }

    fn exists_with_prefix(&self, attribute: &str, prefix: &str) -> Result<bool> {
        (**self).exists_with_prefix(attribute, prefix)
    }

    fn current_aspect(&self, record: &RecordId, field: &str) -> Result<Option<f64>> {
        (**self).current_aspect(record, field)
    }

    fn set_aspect(&self, record: &RecordId, field: &str, aspect: Option<f64>) -> Result<()> {
        (**self).set_aspect(record, field, aspect)
    }
}
