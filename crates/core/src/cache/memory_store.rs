use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::cache::{DurableStore, TtlEntry};
use crate::errors::Result;

type Key = (String, String);

/// Process-local [`DurableStore`], for tests and storage-less deployments.
#[derive(Default)]
pub struct InMemoryDurableStore {
    entries: Mutex<HashMap<Key, TtlEntry<String>>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, TtlEntry<String>>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Writes a row verbatim, bypassing serialization.
    pub fn insert_raw(&self, namespace: &str, key: &str, entry: TtlEntry<String>) {
        self.lock()
            .insert((namespace.to_string(), key.to_string()), entry);
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.lock()
            .contains_key(&(namespace.to_string(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<TtlEntry<String>>> {
        Ok(self
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, namespace: &str, key: &str, entry: TtlEntry<String>) -> Result<()> {
        self.insert_raw(namespace, key, entry);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self
            .lock()
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    async fn clear(&self, namespace: &str) -> Result<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(ns, _), _| ns != namespace);
        Ok(before - entries.len())
    }

    async fn delete_expired(&self, namespace: &str, now: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(ns, _), entry| ns != namespace || entry.is_valid(now));
        Ok(before - entries.len())
    }

    async fn touch(
        &self,
        namespace: &str,
        key: &str,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        match self
            .lock()
            .get_mut(&(namespace.to_string(), key.to_string()))
        {
            Some(entry) => {
                entry.created_at = created_at;
                entry.ttl = ttl;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
