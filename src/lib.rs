//! Cropped, size-stepped image derivatives bound to the lifecycle of record
//! attributes.
//!
//! Load an [`IllustratedConfig`], build an [`Illustrated`] for one owner
//! collection, then call [`Illustrated::save`] and [`Illustrated::delete`]
//! from the record's save and delete paths.

pub mod bootstrap;
mod illustrated;

pub use bootstrap::config::{load_config, IllustratedConfig};
pub use bootstrap::tracing::init_tracing_subscriber;
pub use illustrated::Illustrated;

pub use illu_app::{AttributeInput, AttributeOutcome, SaveReport};
pub use illu_core::{
    AttributeConfig, CropInstruction, IllustrationConfig, IllustrationError, ImageKind, RecordId,
    StoreLayout, Upload,
};
