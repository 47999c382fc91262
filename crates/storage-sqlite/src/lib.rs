//! SQLite storage implementation for TickerHub.
//!
//! This crate provides the database-backed stores behind `tickerhub-core`'s
//! traits, using Diesel ORM with SQLite:
//! - Database connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - The durable cache, quota usage and provider stats stores
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//!
//! ```text
//!   core (routing, caching, quotas)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

// Store implementations
pub mod cache;
pub mod quota;
pub mod stats;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use cache::SqliteCacheStore;
pub use quota::SqliteQuotaStore;
pub use stats::SqliteStatsStore;

// Re-export from tickerhub-core for convenience
pub use tickerhub_core::errors::{DatabaseError, Error, Result};
