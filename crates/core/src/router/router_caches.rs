use std::sync::Arc;

use tickerhub_market_data::{NewsItem, QuoteInfo, TickerSummary};

use crate::cache::{
    CacheJanitor, CacheNamespace, CachePipeline, CacheSettings, DurableCache, DurableStore,
    ExpiringCache, LocalCache,
};
use crate::clock::Clock;

/// The router's three two-layer caches, one per operation.
pub struct RouterCaches {
    pub search: CachePipeline<Vec<TickerSummary>>,
    pub news: CachePipeline<Vec<NewsItem>>,
    pub info: CachePipeline<QuoteInfo>,
    durable: Vec<(CacheNamespace, Arc<dyn ExpiringCache>)>,
}

impl RouterCaches {
    pub fn new(store: Arc<dyn DurableStore>, settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        let search = pipeline(CacheNamespace::Search, &store, settings, &clock);
        let news = pipeline(CacheNamespace::News, &store, settings, &clock);
        let info = pipeline(CacheNamespace::Info, &store, settings, &clock);

        // The janitor gets its own handles; they share the store and namespace.
        let durable: Vec<(CacheNamespace, Arc<dyn ExpiringCache>)> = vec![
            (
                CacheNamespace::Search,
                Arc::new(durable::<Vec<TickerSummary>>(CacheNamespace::Search, &store, settings, &clock)),
            ),
            (
                CacheNamespace::News,
                Arc::new(durable::<Vec<NewsItem>>(CacheNamespace::News, &store, settings, &clock)),
            ),
            (
                CacheNamespace::Info,
                Arc::new(durable::<QuoteInfo>(CacheNamespace::Info, &store, settings, &clock)),
            ),
        ];

        Self {
            search,
            news,
            info,
            durable,
        }
    }

    /// Registers every durable layer with `janitor` under its namespace name.
    pub fn register_with(&self, janitor: &CacheJanitor) {
        for (namespace, cache) in &self.durable {
            janitor.register(namespace.name(), cache.clone());
        }
    }
}

fn durable<T>(
    namespace: CacheNamespace,
    store: &Arc<dyn DurableStore>,
    settings: &CacheSettings,
    clock: &Arc<dyn Clock>,
) -> DurableCache<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
{
    DurableCache::new(
        namespace.name(),
        store.clone(),
        settings.ttl(namespace),
        clock.clone(),
    )
}

fn pipeline<T>(
    namespace: CacheNamespace,
    store: &Arc<dyn DurableStore>,
    settings: &CacheSettings,
    clock: &Arc<dyn Clock>,
) -> CachePipeline<T>
where
    T: Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
{
    CachePipeline::new(
        LocalCache::new(settings.local_capacity, settings.ttl(namespace), clock.clone()),
        durable(namespace, store, settings, clock),
    )
}
