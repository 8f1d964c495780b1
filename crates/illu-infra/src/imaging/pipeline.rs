use std::sync::Arc;

use illu_core::ports::{EncodedLevel, ImagePipelinePort, LevelStream, PreparedDerivation};
use illu_core::{AttributeConfig, CropInstruction, Dimensions, IllustrationError, Upload};
use image::imageops::FilterType;
use tracing::{debug, debug_span};

use super::codec::CodecRegistry;
use super::geometry::GeometryResolver;
use super::pyramid::Pyramid;

/// Raster implementation of [`ImagePipelinePort`] backed by the `image` crate.
///
/// Validation and the crop run eagerly in [`prepare`](ImagePipelinePort::prepare);
/// resizing and encoding of each level happen as the stream is drained.
pub struct RasterPipeline {
    codecs: Arc<CodecRegistry>,
    resolver: GeometryResolver,
    filter: FilterType,
}

impl RasterPipeline {
    pub fn new(codecs: Arc<CodecRegistry>, threshold: u32) -> Self {
        Self {
            codecs,
            resolver: GeometryResolver::new(threshold),
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self.resolver = self.resolver.with_filter(filter);
        self
    }
}

impl ImagePipelinePort for RasterPipeline {
    fn prepare(
        &self,
        upload: &Upload,
        crop: &CropInstruction,
        config: &AttributeConfig,
    ) -> Result<PreparedDerivation, IllustrationError> {
        let span = debug_span!(
            "infra.pipeline.prepare",
            name = %upload.original_name,
            size = upload.bytes.len()
        );
        let _enter = span.enter();

        let input = upload.check(config)?;
        let output = config.mime_override.unwrap_or(input);
        if !self.codecs.can_encode(output) {
            return Err(IllustrationError::UnsupportedType {
                mime: output.mime().to_string(),
            });
        }

        let decoded = self
            .codecs
            .decode(input, &upload.bytes, &upload.original_name)?;
        let source = Dimensions::new(decoded.width(), decoded.height());
        debug!(
            input = %input,
            output = %output,
            width = source.width,
            height = source.height,
            "Upload decoded"
        );

        let resolved = self
            .resolver
            .resolve(decoded, crop, config, &upload.original_name)?;
        let aspect = resolved.aspect;
        let pyramid = Pyramid::new(resolved.raster, aspect, config, self.filter);

        let codecs = Arc::clone(&self.codecs);
        let levels: LevelStream = Box::new(pyramid.map(move |level| {
            let bytes = codecs.encode(output, &level.raster)?;
            Ok(EncodedLevel {
                width: level.width,
                bytes,
            })
        }));

        Ok(PreparedDerivation {
            output,
            source,
            aspect,
            levels,
        })
    }
}
