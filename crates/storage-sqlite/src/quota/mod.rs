//! SQLite storage implementation for provider quota usage.

mod model;
mod repository;

pub use model::ProviderUsageDB;
pub use repository::SqliteQuotaStore;
