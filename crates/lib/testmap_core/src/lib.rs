//! # testmap_core
//!
//! Core domain logic for Testmap: maps issue reports onto existing automated
//! tests by embedding similarity, and keeps the test-description vector
//! store populated.

pub mod corpus;
pub mod embedding;
pub mod experiment;
pub mod generation;
pub mod indexing;
pub mod mapping;
pub mod migrate;
pub mod provider;
pub mod retrieval;
pub mod store;
pub mod uuid;
pub mod workflow;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
pub(crate) mod testing;
