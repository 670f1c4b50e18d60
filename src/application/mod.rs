//! Application layer - the per-request pipeline.
//!
//! Services depend on domain ports (traits) rather than concrete provider
//! adapters, so every stage can be exercised with in-process fakes.

pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use services::{RagService, Timeouts, TOP_K};
