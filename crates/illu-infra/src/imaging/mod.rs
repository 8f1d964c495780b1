//! Decoding, cropping, resizing and encoding of uploaded rasters.

mod codec;
mod geometry;
mod pipeline;
mod pyramid;

pub use codec::{Codec, CodecRegistry, DecodeFn, EncodeFn, EncodeOptions};
pub use geometry::{rotate, GeometryResolver, ResolvedRaster};
pub use pipeline::RasterPipeline;
pub use pyramid::{Pyramid, PyramidLevel};
