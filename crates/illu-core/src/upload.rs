use std::path::Path;

use crate::config::AttributeConfig;
use crate::error::IllustrationError;
use crate::image_kind::ImageKind;

/// Raw upload handed over by the transport layer.
///
/// 传输层交付的原始上传文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub declared_mime: String,
    pub original_name: String,
    /// Transport-level failure reported by the collaborator.
    pub error: Option<String>,
}

impl Upload {
    pub fn new(
        bytes: Vec<u8>,
        declared_mime: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            declared_mime: declared_mime.into(),
            original_name: original_name.into(),
            error: None,
        }
    }

    pub fn failed(original_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            bytes: Vec::new(),
            declared_mime: String::new(),
            original_name: original_name.into(),
            error: Some(reason.into()),
        }
    }

    /// Source type from the declared MIME type, falling back to the
    /// original file name's extension.
    pub fn kind(&self) -> Option<ImageKind> {
        ImageKind::from_mime(&self.declared_mime).or_else(|| {
            Path::new(&self.original_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageKind::from_extension)
        })
    }

    /// Transport and file-type checks done before any decoding.
    pub fn check(&self, config: &AttributeConfig) -> Result<ImageKind, IllustrationError> {
        if let Some(reason) = &self.error {
            return Err(IllustrationError::Upload {
                name: self.original_name.clone(),
                reason: reason.clone(),
            });
        }
        if self.bytes.is_empty() {
            return Err(IllustrationError::Upload {
                name: self.original_name.clone(),
                reason: "file is empty".to_string(),
            });
        }

        let kind = self
            .kind()
            .filter(|kind| config.accepts(*kind))
            .ok_or_else(|| IllustrationError::UnsupportedType {
                mime: if self.declared_mime.is_empty() {
                    self.original_name.clone()
                } else {
                    self.declared_mime.clone()
                },
            })?;

        if let Some(limit) = config.max_upload_bytes {
            let size = self.bytes.len() as u64;
            if size > limit {
                return Err(IllustrationError::UploadTooLarge {
                    name: self.original_name.clone(),
                    size,
                    limit,
                });
            }
        }

        Ok(kind)
    }
}
