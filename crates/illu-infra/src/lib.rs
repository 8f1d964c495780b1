//! Adapters behind the illustration ports: raster pipeline, filesystem
//! store, and SQLite/in-memory record stores.

pub mod db;
pub mod fs;
pub mod imaging;
pub mod memory;

pub use db::repositories::DieselIllustrationRepository;
pub use db::DieselSqliteExecutor;
pub use fs::FsDerivativeStore;
pub use imaging::{CodecRegistry, RasterPipeline};
pub use memory::InMemoryRecordStore;
