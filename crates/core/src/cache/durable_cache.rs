//! Typed view over a [`DurableStore`] namespace.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::{DurableStore, ExpiringCache, TtlEntry};
use crate::clock::Clock;
use crate::errors::Result;

/// Longest key, in bytes, handed to the store.
pub const MAX_KEY_BYTES: usize = 200;

/// Hex digits of the key digest appended to truncated keys.
const DIGEST_SUFFIX_LEN: usize = 16;

/// Maps a caller key onto the store's identifier rules.
///
/// Path separators become `_` and control characters are dropped. Keys that
/// are still too long are cut and suffixed with a digest of the raw key, so
/// two long keys sharing a prefix stay distinct.
pub fn sanitize_key(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if cleaned.len() <= MAX_KEY_BYTES {
        return cleaned;
    }

    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    let mut cut = MAX_KEY_BYTES - DIGEST_SUFFIX_LEN - 1;
    while !cleaned.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}~{}", &cleaned[..cut], &digest[..DIGEST_SUFFIX_LEN])
}

pub struct DurableCache<T> {
    namespace: String,
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    _value: PhantomData<fn() -> T>,
}

impl<T> DurableCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        namespace: impl Into<String>,
        store: Arc<dyn DurableStore>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            ttl,
            clock,
            _value: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads and decodes an entry.
    ///
    /// Without `stale_ok` an expired entry is deleted and reported as a miss.
    /// An entry that no longer decodes is deleted and reported as a miss
    /// regardless of `stale_ok`. A failed delete is logged and still a miss.
    pub async fn get(&self, key: &str, stale_ok: bool) -> Result<Option<T>> {
        let key = sanitize_key(key);
        let entry = match self.store.get(&self.namespace, &key).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        if !stale_ok && entry.is_expired(self.clock.now()) {
            self.discard(&key).await;
            return Ok(None);
        }

        match serde_json::from_str::<T>(&entry.data) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    "Dropping undecodable cache entry {}/{}: {}",
                    self.namespace, key, e
                );
                self.discard(&key).await;
                Ok(None)
            }
        }
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.delete(&self.namespace, key).await {
            warn!(
                "Failed to delete cache entry {}/{}: {}",
                self.namespace, key, e
            );
        }
    }

    /// Writes the value with a fresh TTL.
    pub async fn put(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        let entry = TtlEntry::new(payload, self.clock.now(), self.ttl);
        self.store
            .put(&self.namespace, &sanitize_key(key), entry)
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.store.delete(&self.namespace, &sanitize_key(key)).await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.store.clear(&self.namespace).await
    }

    /// True when a fresh entry exists. Expired rows are left for the sweep.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .store
            .get(&self.namespace, &sanitize_key(key))
            .await?
            .is_some_and(|entry| entry.is_valid(now)))
    }

    /// Extends the entry's life by a full TTL from now.
    pub async fn touch(&self, key: &str) -> Result<bool> {
        self.store
            .touch(&self.namespace, &sanitize_key(key), self.clock.now(), self.ttl)
            .await
    }
}

#[async_trait]
impl<T> ExpiringCache for DurableCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let removed = self
            .store
            .delete_expired(&self.namespace, self.clock.now())
            .await?;
        debug!("Removed {} expired entries from '{}'", removed, self.namespace);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryDurableStore;
    use crate::clock::ManualClock;
    use crate::errors::Error;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<ManualClock>, Arc<InMemoryDurableStore>, DurableCache<Vec<String>>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryDurableStore::new());
        let cache = DurableCache::new("news", store.clone(), Duration::minutes(15), clock.clone());
        (clock, store, cache)
    }

    #[test]
    fn test_sanitize_replaces_separators_and_controls() {
        assert_eq!(sanitize_key("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_key("tab\there\n"), "tabhere");
        assert_eq!(sanitize_key("apple inc"), "apple inc");
    }

    #[test]
    fn test_sanitize_caps_length_and_keeps_long_keys_distinct() {
        let a = format!("{}a", "x".repeat(300));
        let b = format!("{}b", "x".repeat(300));
        let sa = sanitize_key(&a);
        let sb = sanitize_key(&b);
        assert!(sa.len() <= MAX_KEY_BYTES);
        assert!(sb.len() <= MAX_KEY_BYTES);
        assert_ne!(sa, sb);
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let key = "é".repeat(150);
        let sanitized = sanitize_key(&key);
        assert!(sanitized.len() <= MAX_KEY_BYTES);
        assert!(sanitized.contains('~'));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_, _, cache) = setup();
        cache.put("AAPL", &vec!["headline".to_string()]).await.unwrap();
        assert_eq!(
            cache.get("AAPL", false).await.unwrap(),
            Some(vec!["headline".to_string()])
        );
        assert!(cache.exists("AAPL").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_get_deletes_entry() {
        let (clock, store, cache) = setup();
        cache.put("AAPL", &vec![]).await.unwrap();
        clock.advance(Duration::minutes(15));

        assert!(!cache.exists("AAPL").await.unwrap());
        assert!(cache.get("AAPL", false).await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_stale_ok_returns_expired_entry() {
        let (clock, store, cache) = setup();
        cache.put("AAPL", &vec!["old".to_string()]).await.unwrap();
        clock.advance(Duration::hours(2));

        assert_eq!(
            cache.get("AAPL", true).await.unwrap(),
            Some(vec!["old".to_string()])
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_deleted() {
        let (clock, store, cache) = setup();
        store.insert_raw(
            "news",
            "AAPL",
            TtlEntry::new("{not json".to_string(), clock.now(), Duration::minutes(15)),
        );

        assert!(cache.get("AAPL", false).await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_keys_are_sanitized_transparently() {
        let (_, store, cache) = setup();
        cache.put("BRK/B", &vec!["b".to_string()]).await.unwrap();
        assert!(store.contains("news", "BRK_B"));
        assert!(cache.get("BRK/B", false).await.unwrap().is_some());
        assert!(cache.delete("BRK/B").await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_extends_life() {
        let (clock, _, cache) = setup();
        assert!(!cache.touch("AAPL").await.unwrap());

        cache.put("AAPL", &vec![]).await.unwrap();
        clock.advance(Duration::minutes(10));
        assert!(cache.touch("AAPL").await.unwrap());
        clock.advance(Duration::minutes(10));

        assert!(cache.get("AAPL", false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cleanup_expired_only_removes_expired() {
        let (clock, store, cache) = setup();
        cache.put("OLD", &vec![]).await.unwrap();
        clock.advance(Duration::minutes(10));
        cache.put("NEW", &vec![]).await.unwrap();
        clock.advance(Duration::minutes(6));

        assert_eq!(cache.cleanup_expired().await.unwrap(), 1);
        assert!(store.contains("news", "NEW"));
        assert!(!store.contains("news", "OLD"));
    }

    #[tokio::test]
    async fn test_clear_only_touches_own_namespace() {
        let (clock, store, cache) = setup();
        let other: DurableCache<String> =
            DurableCache::new("info", store.clone(), Duration::minutes(1), clock);
        cache.put("A", &vec![]).await.unwrap();
        other.put("A", &"quote".to_string()).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 1);
        assert!(store.contains("info", "A"));
    }

    struct StuckDeleteStore {
        inner: InMemoryDurableStore,
    }

    #[async_trait]
    impl DurableStore for StuckDeleteStore {
        async fn get(&self, namespace: &str, key: &str) -> Result<Option<TtlEntry<String>>> {
            self.inner.get(namespace, key).await
        }

        async fn put(&self, namespace: &str, key: &str, entry: TtlEntry<String>) -> Result<()> {
            self.inner.put(namespace, key, entry).await
        }

        async fn delete(&self, _namespace: &str, _key: &str) -> Result<bool> {
            Err(Error::Unexpected("database is locked".to_string()))
        }

        async fn clear(&self, namespace: &str) -> Result<usize> {
            self.inner.clear(namespace).await
        }

        async fn delete_expired(
            &self,
            namespace: &str,
            now: chrono::DateTime<Utc>,
        ) -> Result<usize> {
            self.inner.delete_expired(namespace, now).await
        }

        async fn touch(
            &self,
            namespace: &str,
            key: &str,
            created_at: chrono::DateTime<Utc>,
            ttl: Duration,
        ) -> Result<bool> {
            self.inner.touch(namespace, key, created_at, ttl).await
        }
    }

    #[tokio::test]
    async fn test_failed_delete_still_reports_miss() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(StuckDeleteStore {
            inner: InMemoryDurableStore::new(),
        });
        store.inner.insert_raw(
            "news",
            "CORRUPT",
            TtlEntry::new("{not json".to_string(), clock.now(), Duration::minutes(15)),
        );
        let cache: DurableCache<Vec<String>> =
            DurableCache::new("news", store.clone(), Duration::minutes(15), clock.clone());
        cache.put("AAPL", &vec!["old".to_string()]).await.unwrap();
        clock.advance(Duration::minutes(20));

        assert!(cache.get("AAPL", false).await.unwrap().is_none());
        assert!(cache.get("CORRUPT", true).await.unwrap().is_none());
        assert!(store.inner.contains("news", "AAPL"));
        assert!(store.inner.contains("news", "CORRUPT"));
    }
}
