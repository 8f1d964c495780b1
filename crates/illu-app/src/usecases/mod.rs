pub mod delete_illustrations;
pub mod illustration_sources;
pub mod save_illustrations;

pub use delete_illustrations::DeleteIllustrations;
pub use illustration_sources::IllustrationSources;
pub use save_illustrations::{AttributeInput, AttributeOutcome, SaveIllustrations, SaveReport};
