//! Secret import entities.

pub mod model;

pub use model::{NewSecretImport, SecretImport, SecretImportWithEnv};
