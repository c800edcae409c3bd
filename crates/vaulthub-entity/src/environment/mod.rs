//! Environment entity.

pub mod model;

pub use model::Environment;
