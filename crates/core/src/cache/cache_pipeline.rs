//! Two-layer cache-aside: a [`LocalCache`] in front of a [`DurableCache`].

use std::future::Future;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{DurableCache, LocalCache};
use crate::errors::Result;

pub struct CachePipeline<T> {
    local: LocalCache<T>,
    durable: DurableCache<T>,
}

impl<T> CachePipeline<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(local: LocalCache<T>, durable: DurableCache<T>) -> Self {
        Self { local, durable }
    }

    pub fn local(&self) -> &LocalCache<T> {
        &self.local
    }

    pub fn durable(&self) -> &DurableCache<T> {
        &self.durable
    }

    /// Looks in the local layer, then the durable one.
    ///
    /// A durable hit is promoted into the local layer only on a fresh read.
    /// A `stale_ok` read must not make stale data look fresh up front.
    /// Durable store failures are logged and read as a miss.
    pub async fn get(&self, key: &str, stale_ok: bool) -> Option<T> {
        if let Some(value) = self.local.get(key, stale_ok) {
            debug!("Cache hit (local) for '{}'", key);
            return Some(value);
        }

        match self.durable.get(key, stale_ok).await {
            Ok(Some(value)) => {
                debug!("Cache hit (durable) for '{}'", key);
                if !stale_ok {
                    self.local.put(key, value.clone());
                }
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Durable cache read failed for '{}': {}", key, e);
                None
            }
        }
    }

    /// Returns the cached value or runs `fetch` once and stores its result
    /// fresh in both layers.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, stale_ok: bool, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key, stale_ok).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.put(key, &value).await;
        Ok(value)
    }

    /// Writes both layers. A durable write failure is logged; the local layer
    /// still holds the value.
    pub async fn put(&self, key: &str, value: &T) {
        self.local.put(key, value.clone());
        if let Err(e) = self.durable.put(key, value).await {
            warn!("Durable cache write failed for '{}': {}", key, e);
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.local.clear();
        self.durable.clear().await?;
        Ok(())
    }
}
