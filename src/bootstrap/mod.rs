//! Composition root: configuration loading, tracing setup and adapter wiring.

pub mod config;
pub mod tracing;
pub mod wiring;
