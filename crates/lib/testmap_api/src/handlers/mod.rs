//! Request handlers.

pub mod experiment;
pub mod health;
pub mod mapping;
pub mod vectors;
pub mod workflows;
