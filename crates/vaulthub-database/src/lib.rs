//! # vaulthub-database
//!
//! Connection pool management and repository implementations.
//!
//! Repositories that participate in multi-table invariants take an
//! explicit [`Tx`] unit of work instead of an optional transaction
//! parameter: "runs inside the caller's transaction" is a checked
//! capability of the method signature, not a convention.

pub mod connection;
pub mod migration;
pub mod repositories;

/// Unit-of-work handle: an open PostgreSQL transaction.
///
/// Services begin a `Tx` from the pool, thread it through every write
/// that belongs to one invariant set, then commit. Dropping it rolls
/// back everything.
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;
