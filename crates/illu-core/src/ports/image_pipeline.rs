use std::fmt;
use std::sync::Arc;

use crate::config::AttributeConfig;
use crate::crop::CropInstruction;
use crate::error::IllustrationError;
use crate::geometry::Dimensions;
use crate::image_kind::ImageKind;
use crate::upload::Upload;

/// One encoded pyramid level. `width` is the nominal level width, `None` for
/// the single unlayered derivative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLevel {
    pub width: Option<u32>,
    pub bytes: Vec<u8>,
}

/// Lazy, single-pass sequence of levels, largest first.
pub type LevelStream = Box<dyn Iterator<Item = Result<EncodedLevel, IllustrationError>> + Send>;

/// A validated upload ready to be drained into the store.
pub struct PreparedDerivation {
    /// Type every level is encoded as.
    pub output: ImageKind,
    /// Pixel size of the decoded upload.
    pub source: Dimensions,
    /// Aspect ratio (width / height) the levels are sized with.
    pub aspect: f64,
    pub levels: LevelStream,
}

impl fmt::Debug for PreparedDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedDerivation")
            .field("output", &self.output)
            .field("source", &self.source)
            .field("aspect", &self.aspect)
            .finish_non_exhaustive()
    }
}

/// Decode, validate and derive the pyramid for one upload.
///
/// 解码、校验上传图像并生成派生金字塔。
pub trait ImagePipelinePort: Send + Sync {
    /// All validation (type, size, decoding, crop bounds, minimum size)
    /// happens here, before the first level is produced.
    fn prepare(
        &self,
        upload: &Upload,
        crop: &CropInstruction,
        config: &AttributeConfig,
    ) -> Result<PreparedDerivation, IllustrationError>;
}

impl<T: ImagePipelinePort + ?Sized> ImagePipelinePort for Arc<T> {
    fn prepare(
        &self,
        upload: &Upload,
        crop: &CropInstruction,
        config: &AttributeConfig,
    ) -> Result<PreparedDerivation, IllustrationError> {
        (**self).prepare(upload, crop, config)
    }
}
