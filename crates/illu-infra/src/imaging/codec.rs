//! MIME type → decode / encode capability lookup.

use std::collections::HashMap;
use std::io::Cursor;

use illu_core::{IllustrationError, ImageKind};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageResult};

pub type DecodeFn = fn(&[u8], ImageFormat) -> ImageResult<DynamicImage>;
pub type EncodeFn = fn(&DynamicImage, ImageFormat, &EncodeOptions) -> ImageResult<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub jpeg_quality: u8,
    pub avif_quality: u8,
    pub avif_speed: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            avif_quality: 80,
            avif_speed: 6,
        }
    }
}

/// Capabilities registered for one image kind. A missing function means the
/// kind cannot be decoded (or encoded) by this registry.
#[derive(Clone, Copy)]
pub struct Codec {
    pub format: ImageFormat,
    pub decode: Option<DecodeFn>,
    pub encode: Option<EncodeFn>,
}

pub struct CodecRegistry {
    codecs: HashMap<ImageKind, Codec>,
    options: EncodeOptions,
}

impl CodecRegistry {
    pub fn empty(options: EncodeOptions) -> Self {
        Self {
            codecs: HashMap::new(),
            options,
        }
    }

    /// Registry for `{bmp, gif, jpeg, png, webp, avif}`.
    ///
    /// AVIF is encode-only: decoding it needs a native dav1d build.
    pub fn with_defaults(options: EncodeOptions) -> Self {
        let decode: Option<DecodeFn> = Some(image::load_from_memory_with_format);
        Self::empty(options)
            .register(
                ImageKind::Bmp,
                Codec {
                    format: ImageFormat::Bmp,
                    decode,
                    encode: Some(encode_rgba),
                },
            )
            .register(
                ImageKind::Gif,
                Codec {
                    format: ImageFormat::Gif,
                    decode,
                    encode: Some(encode_rgba),
                },
            )
            .register(
                ImageKind::Jpeg,
                Codec {
                    format: ImageFormat::Jpeg,
                    decode,
                    encode: Some(encode_jpeg),
                },
            )
            .register(
                ImageKind::Png,
                Codec {
                    format: ImageFormat::Png,
                    decode,
                    encode: Some(encode_rgba),
                },
            )
            .register(
                ImageKind::Webp,
                Codec {
                    format: ImageFormat::WebP,
                    decode,
                    encode: Some(encode_rgba),
                },
            )
            .register(
                ImageKind::Avif,
                Codec {
                    format: ImageFormat::Avif,
                    decode: None,
                    encode: Some(encode_avif),
                },
            )
    }

    pub fn register(mut self, kind: ImageKind, codec: Codec) -> Self {
        self.codecs.insert(kind, codec);
        self
    }

    pub fn can_decode(&self, kind: ImageKind) -> bool {
        self.codecs.get(&kind).is_some_and(|c| c.decode.is_some())
    }

    pub fn can_encode(&self, kind: ImageKind) -> bool {
        self.codecs.get(&kind).is_some_and(|c| c.encode.is_some())
    }

    pub fn decode(
        &self,
        kind: ImageKind,
        bytes: &[u8],
        name: &str,
    ) -> Result<DynamicImage, IllustrationError> {
        let codec = self.codecs.get(&kind);
        let decode = codec
            .and_then(|c| c.decode.map(|f| (f, c.format)))
            .ok_or_else(|| IllustrationError::UnsupportedType {
                mime: kind.mime().to_string(),
            })?;
        (decode.0)(bytes, decode.1).map_err(|e| IllustrationError::Decode {
            name: name.to_string(),
            kind,
            reason: e.to_string(),
        })
    }

    pub fn encode(
        &self,
        kind: ImageKind,
        raster: &DynamicImage,
    ) -> Result<Vec<u8>, IllustrationError> {
        let codec = self.codecs.get(&kind);
        let encode = codec
            .and_then(|c| c.encode.map(|f| (f, c.format)))
            .ok_or_else(|| IllustrationError::UnsupportedType {
                mime: kind.mime().to_string(),
            })?;
        (encode.0)(raster, encode.1, &self.options).map_err(|e| IllustrationError::Encode {
            kind,
            reason: e.to_string(),
        })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults(EncodeOptions::default())
    }
}

fn encode_rgba(
    raster: &DynamicImage,
    format: ImageFormat,
    _: &EncodeOptions,
) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(raster.to_rgba8()).write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

// JPEG has no alpha channel.
fn encode_jpeg(
    raster: &DynamicImage,
    _: ImageFormat,
    options: &EncodeOptions,
) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(raster.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, options.jpeg_quality))?;
    Ok(bytes)
}

fn encode_avif(
    raster: &DynamicImage,
    _: ImageFormat,
    options: &EncodeOptions,
) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(raster.to_rgba8()).write_with_encoder(
        AvifEncoder::new_with_speed_quality(&mut bytes, options.avif_speed, options.avif_quality),
    )?;
    Ok(bytes)
}
