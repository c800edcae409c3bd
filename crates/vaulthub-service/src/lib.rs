//! # vaulthub-service
//!
//! Business logic services. Each service orchestrates repositories and
//! the blind-index codec behind a transaction boundary; none of them
//! know about transports.

pub mod context;
pub mod folder;
pub mod import;
pub mod notify;
pub mod secret;
