use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::image_kind::ImageKind;

/// Failure of one attribute's save or delete.
///
/// Every variant is scoped to a single (record, attribute) pair; none of them
/// leaves another attribute or record in an inconsistent state.
#[derive(Debug, Error)]
pub enum IllustrationError {
    #[error("upload of \"{name}\" failed: {reason}")]
    Upload { name: String, reason: String },

    #[error("file type \"{mime}\" is not allowed")]
    UnsupportedType { mime: String },

    #[error("file \"{name}\" is too big ({size} bytes, limit {limit})")]
    UploadTooLarge { name: String, size: u64, limit: u64 },

    #[error("cannot decode \"{name}\" as {kind}: {reason}")]
    Decode {
        name: String,
        kind: ImageKind,
        reason: String,
    },

    #[error("cannot encode derivative as {kind}: {reason}")]
    Encode { kind: ImageKind, reason: String },

    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    #[error("{message}")]
    TooSmall {
        original_name: String,
        width: u32,
        height: u32,
        message: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no free file name after {attempts} attempts")]
    NamingExhausted { attempts: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown illustration attribute \"{0}\"")]
    UnknownAttribute(String),

    #[error(transparent)]
    Record(#[from] anyhow::Error),
}

impl IllustrationError {
    /// Whether this error is a user-facing validation failure that a form
    /// layer should render next to the attribute.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. }
                | Self::UnsupportedType { .. }
                | Self::UploadTooLarge { .. }
                | Self::Decode { .. }
                | Self::InvalidCrop(_)
                | Self::TooSmall { .. }
        )
    }
}

/// Filesystem failure of the derivative store.
///
/// 派生图像存储的文件系统错误。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("create directory {} failed: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write {} failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("delete {} failed: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
