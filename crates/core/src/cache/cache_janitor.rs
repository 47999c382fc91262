//! Startup sweep over registered durable caches.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{error, info};
use tokio::task::JoinHandle;

use crate::cache::ExpiringCache;

/// Outcome of one sweep, per registered cache.
#[derive(Debug, Default)]
pub struct JanitorReport {
    pub cleaned: Vec<(String, usize)>,
    pub failed: Vec<(String, String)>,
}

impl JanitorReport {
    pub fn total_removed(&self) -> usize {
        self.cleaned.iter().map(|(_, n)| n).sum()
    }
}

#[derive(Default)]
pub struct CacheJanitor {
    caches: RwLock<BTreeMap<String, Arc<dyn ExpiringCache>>>,
}

impl CacheJanitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<dyn ExpiringCache>>> {
        self.caches.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn ExpiringCache>>> {
        self.caches.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Registers a cache, replacing any previous one under the same name.
    pub fn register(&self, name: impl Into<String>, cache: Arc<dyn ExpiringCache>) {
        self.write().insert(name.into(), cache);
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn registered(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Runs `cleanup_expired` on every registered cache. A failing cache is
    /// logged and skipped.
    pub async fn run_startup_cleanup(&self) -> JanitorReport {
        let caches: Vec<(String, Arc<dyn ExpiringCache>)> = self
            .read()
            .iter()
            .map(|(name, cache)| (name.clone(), cache.clone()))
            .collect();

        let mut report = JanitorReport::default();
        for (name, cache) in caches {
            match cache.cleanup_expired().await {
                Ok(removed) => {
                    info!("Cache '{}': removed {} expired entries", name, removed);
                    report.cleaned.push((name, removed));
                }
                Err(e) => {
                    error!("Cache '{}': expiry sweep failed: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report
    }

    /// Starts the sweep on the runtime without waiting for it.
    pub fn spawn_startup_cleanup(self: &Arc<Self>) -> JoinHandle<JanitorReport> {
        let janitor = Arc::clone(self);
        tokio::spawn(async move { janitor.run_startup_cleanup().await })
    }

    pub fn shutdown(&self) {
        self.write().clear();
    }
}
