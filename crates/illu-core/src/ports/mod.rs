//! Port interfaces for the application layer
//!
//! Ports define the contract between the illustration use cases and the
//! infrastructure that stores records, files and rasters. The use cases only
//! ever talk to these traits.
//!
//! All ports are synchronous: one save or delete runs in-process on the
//! caller's thread.

mod derivative_store;
mod image_pipeline;
mod record;

pub use derivative_store::DerivativeStorePort;
pub use image_pipeline::{EncodedLevel, ImagePipelinePort, LevelStream, PreparedDerivation};
pub use record::IllustrationRecordPort;
