//! # illu-core
//!
//! Core domain models and ports for illustrated record attributes: crop
//! instructions, per-attribute configuration, geometry planning, artifact
//! naming and the derivative directory layout.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod image_kind;
pub mod layout;
pub mod naming;
pub mod ports;
pub mod upload;

// Re-export commonly used types at the crate root
pub use config::{AttributeConfig, IllustrationConfig, DEFAULT_THRESHOLD};
pub use crop::CropInstruction;
pub use error::{IllustrationError, StorageError};
pub use geometry::{CropRect, Dimensions};
pub use ids::{RecordId, Stem};
pub use image_kind::ImageKind;
pub use layout::{ArtifactKey, DerivedArtifactSet, StoreLayout};
pub use naming::{ArtifactName, StemAllocator};
pub use upload::Upload;
