//! Secret import declarations and resolution.

pub mod service;

pub use service::{ImportService, ImportedSecretGroup};
