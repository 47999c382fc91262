use diesel::prelude::*;

use crate::utils::datetime_from_millis;
use tickerhub_core::cache::TtlEntry;

/// One serialized cache entry. Times are epoch milliseconds.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::cache_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CacheEntryDB {
    pub namespace: String,
    pub cache_key: String,
    pub payload: String,
    pub created_at: i64,
    pub ttl_ms: i64,
    pub expires_at: i64,
}

impl CacheEntryDB {
    pub fn from_entry(namespace: &str, key: &str, entry: TtlEntry<String>) -> Self {
        let expires_at = entry.expires_at().timestamp_millis();
        Self {
            namespace: namespace.to_string(),
            cache_key: key.to_string(),
            created_at: entry.created_at.timestamp_millis(),
            ttl_ms: entry.ttl.num_milliseconds(),
            expires_at,
            payload: entry.data,
        }
    }
}

impl From<CacheEntryDB> for TtlEntry<String> {
    fn from(db: CacheEntryDB) -> Self {
        TtlEntry::new(
            db.payload,
            datetime_from_millis(db.created_at),
            chrono::Duration::milliseconds(db.ttl_ms),
        )
    }
}
