use std::sync::{Arc, RwLock};

use log::info;
use tickerhub_market_data::{Provider, ProviderConfig};

use super::{ConfigSource, RoutingConfig};
use crate::errors::{Error, Result};

/// Hot-reloadable routing configuration.
///
/// Readers take an `Arc` snapshot and keep using it for the whole request;
/// a refresh swaps the whole snapshot at once.
pub struct RoutingSettings {
    source: Arc<dyn ConfigSource>,
    current: RwLock<Arc<RoutingConfig>>,
}

impl RoutingSettings {
    /// Loads the initial snapshot from `source`.
    pub fn load(source: Arc<dyn ConfigSource>) -> Result<Self> {
        let config = source.load()?;
        Ok(Self::with_config(source, config))
    }

    pub fn with_config(source: Arc<dyn ConfigSource>, config: RoutingConfig) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<RoutingConfig> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn swap(&self, config: RoutingConfig) -> Arc<RoutingConfig> {
        let next = Arc::new(config);
        *self.current.write().unwrap_or_else(|p| p.into_inner()) = next.clone();
        next
    }

    /// Reloads from the source. On failure the current snapshot stays.
    pub fn refresh(&self) -> Result<Arc<RoutingConfig>> {
        let config = self.source.load()?;
        let next = self.swap(config);
        info!(
            "Routing config refreshed: {} providers configured",
            next.providers.len()
        );
        Ok(next)
    }

    /// Persists `config` then makes it current.
    pub fn update(&self, config: RoutingConfig) -> Result<Arc<RoutingConfig>> {
        self.source.persist(&config)?;
        Ok(self.swap(config))
    }

    pub fn provider_config(&self, provider: Provider) -> Result<ProviderConfig> {
        self.snapshot()
            .provider(provider)
            .cloned()
            .ok_or(Error::ConfigMissing(provider))
    }
}
