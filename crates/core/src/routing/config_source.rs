//! Where routing configuration comes from and goes back to.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use tickerhub_market_data::Provider;

use super::RoutingConfig;
use crate::errors::{Error, Result};

pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<RoutingConfig>;

    fn persist(&self, config: &RoutingConfig) -> Result<()>;
}

/// Name of the variable that overrides a provider's API key.
pub fn api_key_env_var(provider: Provider) -> String {
    format!("TH_{}_API_KEY", provider.id())
}

/// JSON document on disk.
///
/// A non-empty `TH_<PROVIDER_ID>_API_KEY` variable replaces the file's key for
/// that provider. Keys that came from the environment are blanked when the
/// document is written back, so secrets never land in the file.
pub struct JsonFileConfigSource {
    path: PathBuf,
    env_overrides: bool,
    overridden: Mutex<HashSet<Provider>>,
}

impl JsonFileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_overrides: true,
            overridden: Mutex::new(HashSet::new()),
        }
    }

    /// Ignores `TH_*_API_KEY` variables.
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn overridden(&self) -> MutexGuard<'_, HashSet<Provider>> {
        self.overridden.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ConfigSource for JsonFileConfigSource {
    fn load(&self) -> Result<RoutingConfig> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        let mut config: RoutingConfig = serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("Cannot parse {}: {}", self.path.display(), e))
        })?;

        let mut overridden = HashSet::new();
        if self.env_overrides {
            for (provider, provider_config) in config.providers.iter_mut() {
                if let Ok(key) = std::env::var(api_key_env_var(*provider)) {
                    if !key.trim().is_empty() {
                        provider_config.api_key = key.trim().to_string();
                        overridden.insert(*provider);
                    }
                }
            }
        }
        debug!(
            "Loaded routing config from {} ({} providers, {} keys from environment)",
            self.path.display(),
            config.providers.len(),
            overridden.len()
        );
        *self.overridden() = overridden;

        Ok(config)
    }

    fn persist(&self, config: &RoutingConfig) -> Result<()> {
        let mut on_disk = config.clone();
        {
            let overridden = self.overridden();
            for (provider, provider_config) in on_disk.providers.iter_mut() {
                if overridden.contains(provider) {
                    provider_config.api_key.clear();
                }
            }
        }

        let json = serde_json::to_string_pretty(&on_disk)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write-then-rename so readers never see a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        info!("Routing config written to {}", self.path.display());
        Ok(())
    }
}

/// Config held in memory; `persist` replaces it.
#[derive(Default)]
pub struct InMemoryConfigSource {
    config: Mutex<RoutingConfig>,
}

impl InMemoryConfigSource {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    /// Replaces the stored config without going through `persist`.
    pub fn replace(&self, config: RoutingConfig) {
        *self.config.lock().unwrap_or_else(|p| p.into_inner()) = config;
    }
}

impl ConfigSource for InMemoryConfigSource {
    fn load(&self) -> Result<RoutingConfig> {
        Ok(self.config.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn persist(&self, config: &RoutingConfig) -> Result<()> {
        self.replace(config.clone());
        Ok(())
    }
}
