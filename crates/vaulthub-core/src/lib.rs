//! # vaulthub-core
//!
//! Core crate for VaultHub. Contains configuration schemas, collaborator
//! traits, shared types (actor identity, secret paths), and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other VaultHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
