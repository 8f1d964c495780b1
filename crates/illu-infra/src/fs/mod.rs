pub mod derivative_store;

pub use derivative_store::FsDerivativeStore;
