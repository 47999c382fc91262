use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tickerhub_market_data::Provider;

use super::{LimitUsage, QuotaStore, UsageUpdate};
use crate::errors::Result;

/// Process-local [`QuotaStore`]. The mutex makes each update atomic.
#[derive(Default)]
pub struct InMemoryQuotaStore {
    usage: Mutex<HashMap<Provider, LimitUsage>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Provider, LimitUsage>> {
        self.usage.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Overwrites a provider's record directly.
    pub fn set(&self, provider: Provider, usage: LimitUsage) {
        self.lock().insert(provider, usage);
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn get_usage(&self, provider: Provider) -> Result<Option<LimitUsage>> {
        Ok(self.lock().get(&provider).copied())
    }

    async fn update_usage(&self, provider: Provider, update: UsageUpdate) -> Result<Option<LimitUsage>> {
        let mut usage = self.lock();
        let current = usage.get(&provider).copied().unwrap_or_default();
        let next = update(current);
        if let Some(next) = next {
            usage.insert(provider, next);
        }
        Ok(next)
    }

    async fn reset_usage(&self, provider: Provider) -> Result<()> {
        self.lock().remove(&provider);
        Ok(())
    }

    async fn reset_all_usage(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }

    async fn get_all_usage(&self) -> Result<Vec<(Provider, LimitUsage)>> {
        let mut all: Vec<_> = self.lock().iter().map(|(p, u)| (*p, *u)).collect();
        all.sort_by_key(|(p, _)| *p);
        Ok(all)
    }
}
