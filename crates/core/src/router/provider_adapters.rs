use std::collections::HashMap;
use std::sync::Arc;

use tickerhub_market_data::{InfoProvider, NewsProvider, Operation, Provider, SearchProvider};

/// Registered adapters, per operation.
#[derive(Clone, Default)]
pub struct ProviderAdapters {
    search: HashMap<Provider, Arc<dyn SearchProvider>>,
    news: HashMap<Provider, Arc<dyn NewsProvider>>,
    info: HashMap<Provider, Arc<dyn InfoProvider>>,
}

impl ProviderAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, adapter: Arc<dyn SearchProvider>) -> Self {
        self.search.insert(adapter.provider(), adapter);
        self
    }

    pub fn with_news(mut self, adapter: Arc<dyn NewsProvider>) -> Self {
        self.news.insert(adapter.provider(), adapter);
        self
    }

    pub fn with_info(mut self, adapter: Arc<dyn InfoProvider>) -> Self {
        self.info.insert(adapter.provider(), adapter);
        self
    }

    /// Registers an adapter for all three operations.
    pub fn with_all<A>(self, adapter: Arc<A>) -> Self
    where
        A: SearchProvider + NewsProvider + InfoProvider + 'static,
    {
        self.with_search(adapter.clone())
            .with_news(adapter.clone())
            .with_info(adapter)
    }

    pub fn search(&self, provider: Provider) -> Option<&Arc<dyn SearchProvider>> {
        self.search.get(&provider)
    }

    pub fn news(&self, provider: Provider) -> Option<&Arc<dyn NewsProvider>> {
        self.news.get(&provider)
    }

    pub fn info(&self, provider: Provider) -> Option<&Arc<dyn InfoProvider>> {
        self.info.get(&provider)
    }

    pub fn supports(&self, operation: Operation, provider: Provider) -> bool {
        match operation {
            Operation::Search => self.search.contains_key(&provider),
            Operation::News => self.news.contains_key(&provider),
            Operation::Info => self.info.contains_key(&provider),
        }
    }
}
