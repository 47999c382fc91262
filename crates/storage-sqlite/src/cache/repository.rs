use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::CacheEntryDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::cache_entries::dsl;
use tickerhub_core::cache::{DurableStore, TtlEntry};
use tickerhub_core::Result;

/// [`DurableStore`] over the `cache_entries` table. Every namespace shares the table.
pub struct SqliteCacheStore {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SqliteCacheStore {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl DurableStore for SqliteCacheStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<TtlEntry<String>>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::cache_entries
            .filter(dsl::namespace.eq(namespace))
            .filter(dsl::cache_key.eq(key))
            .select(CacheEntryDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(TtlEntry::from))
    }

    async fn put(&self, namespace: &str, key: &str, entry: TtlEntry<String>) -> Result<()> {
        let row = CacheEntryDB::from_entry(namespace, key, entry);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(dsl::cache_entries)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let namespace = namespace.to_string();
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                let removed = diesel::delete(
                    dsl::cache_entries
                        .filter(dsl::namespace.eq(&namespace))
                        .filter(dsl::cache_key.eq(&key)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed > 0)
            })
            .await
    }

    async fn clear(&self, namespace: &str) -> Result<usize> {
        let namespace = namespace.to_string();
        self.writer
            .exec(move |conn| {
                let removed =
                    diesel::delete(dsl::cache_entries.filter(dsl::namespace.eq(&namespace)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                debug!("Cleared {} cache entries from '{}'", removed, namespace);
                Ok(removed)
            })
            .await
    }

    async fn delete_expired(&self, namespace: &str, now: DateTime<Utc>) -> Result<usize> {
        let namespace = namespace.to_string();
        let now_ms = now.timestamp_millis();
        self.writer
            .exec(move |conn| {
                let removed = diesel::delete(
                    dsl::cache_entries
                        .filter(dsl::namespace.eq(&namespace))
                        .filter(dsl::expires_at.le(now_ms)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }

    async fn touch(
        &self,
        namespace: &str,
        key: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        let namespace = namespace.to_string();
        let key = key.to_string();
        let created_ms = created_at.timestamp_millis();
        let ttl_ms = ttl.num_milliseconds();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(
                    dsl::cache_entries
                        .filter(dsl::namespace.eq(&namespace))
                        .filter(dsl::cache_key.eq(&key)),
                )
                .set((
                    dsl::created_at.eq(created_ms),
                    dsl::ttl_ms.eq(ttl_ms),
                    dsl::expires_at.eq(created_ms.saturating_add(ttl_ms)),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(updated > 0)
            })
            .await
    }
}
