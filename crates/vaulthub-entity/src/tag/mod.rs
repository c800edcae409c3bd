//! Secret tag entities.

pub mod model;

pub use model::{SecretTag, SecretTagLink};
