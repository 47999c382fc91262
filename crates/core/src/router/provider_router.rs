//! Routes each request to the best provider that still has quota.
//!
//! Per request: cache check, provider selection (the only step that may walk
//! several providers), a single invocation, then cache write-back. A claimed
//! quota unit is never refunded and a failed call is never retried on another
//! provider.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tickerhub_market_data::{
    MarketDataError, NewsItem, Operation, Provider, ProviderConfig, QuoteInfo, TickerSummary,
};

use super::{ProviderAdapters, RouterCaches, SelectionDiagnostics, SkipReason};
use crate::cache::{CacheNamespace, CachePipeline};
use crate::errors::{Error, Result};
use crate::quota::QuotaTracker;
use crate::routing::RoutingSettings;
use crate::stats::StatsSink;

pub struct ProviderRouter {
    settings: Arc<RoutingSettings>,
    adapters: ProviderAdapters,
    quota: Arc<QuotaTracker>,
    caches: Arc<RouterCaches>,
    stats: Arc<dyn StatsSink>,
    provider_timeout: Option<Duration>,
}

impl ProviderRouter {
    pub fn new(
        settings: Arc<RoutingSettings>,
        adapters: ProviderAdapters,
        quota: Arc<QuotaTracker>,
        caches: Arc<RouterCaches>,
        stats: Arc<dyn StatsSink>,
    ) -> Self {
        Self {
            settings,
            adapters,
            quota,
            caches,
            stats,
            provider_timeout: None,
        }
    }

    /// Deadline for a single provider call. Elapsing counts as a provider failure.
    pub fn with_provider_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &Arc<RoutingSettings> {
        &self.settings
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn caches(&self) -> &Arc<RouterCaches> {
        &self.caches
    }

    pub async fn search(&self, query: &str) -> Result<Vec<TickerSummary>> {
        let key = CacheNamespace::Search.normalize_key(query);
        if key.is_empty() {
            return Err(Error::Validation("Search query must not be blank".to_string()));
        }

        if let Some(hit) = self.caches.search.get(&key, false).await {
            return Ok(hit);
        }

        let (provider, config) = self.select(Operation::Search).await?;
        let adapter = self
            .adapters
            .search(provider)
            .ok_or_else(|| missing_adapter(Operation::Search, provider))?;

        let results = self
            .invoke(Operation::Search, provider, adapter.search(&config, query.trim()))
            .await?;

        // Adapters turn rate-limited and unauthorized replies into an empty
        // list (`MarketDataError::is_recoverable`), so empty is never cached.
        if !results.is_empty() {
            self.caches.search.put(&key, &results).await;
        }
        Ok(results)
    }

    pub async fn news(&self, tickers: &[String]) -> Result<HashMap<String, Vec<NewsItem>>> {
        let symbols = normalize_tickers(tickers, CacheNamespace::News)?;
        let (mut result, misses) = partition(&self.caches.news, symbols).await;
        if misses.is_empty() {
            return Ok(result);
        }

        let (provider, config) = self.select(Operation::News).await?;
        let adapter = self
            .adapters
            .news(provider)
            .ok_or_else(|| missing_adapter(Operation::News, provider))?;

        let fetched = self
            .invoke(Operation::News, provider, adapter.news(&config, &misses))
            .await?;

        merge(&self.caches.news, CacheNamespace::News, &misses, fetched, &mut result).await;
        Ok(result)
    }

    pub async fn info(&self, tickers: &[String]) -> Result<HashMap<String, QuoteInfo>> {
        let symbols = normalize_tickers(tickers, CacheNamespace::Info)?;
        let (mut result, misses) = partition(&self.caches.info, symbols).await;
        if misses.is_empty() {
            return Ok(result);
        }

        let (provider, config) = self.select(Operation::Info).await?;
        let adapter = self
            .adapters
            .info(provider)
            .ok_or_else(|| missing_adapter(Operation::Info, provider))?;

        let fetched = self
            .invoke(Operation::Info, provider, adapter.info(&config, &misses))
            .await?;

        merge(&self.caches.info, CacheNamespace::Info, &misses, fetched, &mut result).await;
        Ok(result)
    }

    /// Walks the ranking for `operation` and claims quota on the first
    /// provider that has an adapter, a config and capacity.
    async fn select(&self, operation: Operation) -> Result<(Provider, ProviderConfig)> {
        let snapshot = self.settings.snapshot();
        let mut diagnostics = SelectionDiagnostics::new();

        for provider in snapshot.priorities.ranked(operation) {
            if !self.adapters.supports(operation, provider) {
                debug!("{}: skipping {}, no adapter", operation, provider);
                diagnostics.record_skip(provider, SkipReason::NoAdapter);
                continue;
            }

            let Some(config) = snapshot.provider(provider) else {
                debug!("{}: skipping {}, not configured", operation, provider);
                diagnostics.record_skip(provider, SkipReason::NotConfigured);
                continue;
            };

            // A refused claim, including one lost to a concurrent request,
            // moves on to the next provider.
            match self.quota.try_increment_usage(provider, &config.limit).await? {
                Some(usage) => {
                    diagnostics.record_selected(provider);
                    info!(
                        "{}: selected {} (used {}) [{}]",
                        operation,
                        provider,
                        usage.used_count,
                        diagnostics.summary()
                    );
                    return Ok((provider, config.clone()));
                }
                None => {
                    debug!("{}: skipping {}, no capacity", operation, provider);
                    diagnostics.record_skip(provider, SkipReason::NoCapacity);
                }
            }
        }

        warn!(
            "{}: all providers exhausted [{}]",
            operation,
            diagnostics.summary()
        );
        Err(Error::QuotaExhausted { operation })
    }

    async fn invoke<T, F>(&self, operation: Operation, provider: Provider, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, MarketDataError>>,
    {
        self.stats.record_selection(provider);

        let outcome = match self.provider_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| {
                    Err(MarketDataError::Timeout {
                        provider: provider.id().to_string(),
                    })
                }),
            None => call.await,
        };

        outcome.map_err(|e| {
            self.stats.record_failure(provider);
            warn!("{}: {} failed: {}", operation, provider, e);
            Error::MarketData(e)
        })
    }
}

fn missing_adapter(operation: Operation, provider: Provider) -> Error {
    Error::Unexpected(format!("{} was selected for {} without an adapter", provider, operation))
}

/// Normalized, de-duplicated symbols in request order.
fn normalize_tickers(tickers: &[String], namespace: CacheNamespace) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let symbols: Vec<String> = tickers
        .iter()
        .map(|t| namespace.normalize_key(t))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if symbols.is_empty() {
        return Err(Error::Validation("At least one ticker is required".to_string()));
    }
    Ok(symbols)
}

/// Splits `symbols` into cached values and the symbols still to fetch.
async fn partition<T>(cache: &CachePipeline<T>, symbols: Vec<String>) -> (HashMap<String, T>, Vec<String>)
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    let mut hits = HashMap::new();
    let mut misses = Vec::new();
    for symbol in symbols {
        match cache.get(&symbol, false).await {
            Some(value) => {
                hits.insert(symbol, value);
            }
            None => misses.push(symbol),
        }
    }
    (hits, misses)
}

/// Caches and merges whatever part of `misses` the provider answered.
async fn merge<T>(
    cache: &CachePipeline<T>,
    namespace: CacheNamespace,
    misses: &[String],
    fetched: HashMap<String, T>,
    result: &mut HashMap<String, T>,
) where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    for (symbol, value) in fetched {
        let symbol = namespace.normalize_key(&symbol);
        if !misses.contains(&symbol) {
            debug!("Ignoring unrequested symbol '{}' in provider response", symbol);
            continue;
        }
        cache.put(&symbol, &value).await;
        result.insert(symbol, value);
    }

    let missing = misses.iter().filter(|s| !result.contains_key(*s)).count();
    if missing > 0 {
        debug!("Provider returned nothing for {} of {} symbols", missing, misses.len());
    }
}
