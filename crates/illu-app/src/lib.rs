//! Use cases binding derived image sets to the lifecycle of their records.

pub mod usecases;

pub use usecases::{
    AttributeInput, AttributeOutcome, DeleteIllustrations, IllustrationSources, SaveIllustrations,
    SaveReport,
};
