//! Storage contract behind [`DurableCache`](super::DurableCache).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::cache::TtlEntry;
use crate::errors::Result;

/// Persistent key/value store holding serialized TTL entries.
///
/// Entries are grouped by namespace so several caches can share one backend.
/// Keys reaching the store are already sanitized.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<TtlEntry<String>>>;

    /// Inserts or replaces the entry.
    async fn put(&self, namespace: &str, key: &str, entry: TtlEntry<String>) -> Result<()>;

    /// Returns whether a row was removed.
    async fn delete(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Removes every entry in the namespace, returning the count.
    async fn clear(&self, namespace: &str) -> Result<usize>;

    /// Removes every entry in the namespace whose expiry is at or before `now`.
    async fn delete_expired(&self, namespace: &str, now: DateTime<Utc>) -> Result<usize>;

    /// Restarts the entry's TTL window at `created_at` without touching its
    /// payload. Returns false when no entry exists.
    async fn touch(
        &self,
        namespace: &str,
        key: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool>;
}

/// A durable cache the janitor can sweep.
#[async_trait]
pub trait ExpiringCache: Send + Sync {
    fn namespace(&self) -> &str;

    async fn cleanup_expired(&self) -> Result<usize>;
}
