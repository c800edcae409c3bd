//! Secret CRUD, batching, and reference expansion.

pub mod expand;
pub mod service;

pub use expand::{DbSecretLookup, ReferenceExpander, SecretLookup};
pub use service::SecretService;
