use chrono::Duration;
use tickerhub_market_data::Operation;

/// One cache per routed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Search,
    News,
    Info,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 3] = [
        CacheNamespace::Search,
        CacheNamespace::News,
        CacheNamespace::Info,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CacheNamespace::Search => "search",
            CacheNamespace::News => "news",
            CacheNamespace::Info => "info",
        }
    }

    /// Search is keyed by the query, case-folded to lower case; news and info
    /// by the ticker symbol in upper case.
    pub fn normalize_key(&self, raw: &str) -> String {
        match self {
            CacheNamespace::Search => raw.trim().to_lowercase(),
            CacheNamespace::News | CacheNamespace::Info => raw.trim().to_uppercase(),
        }
    }
}

impl From<Operation> for CacheNamespace {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Search => CacheNamespace::Search,
            Operation::News => CacheNamespace::News,
            Operation::Info => CacheNamespace::Info,
        }
    }
}

/// Sizes and lifetimes for the router's caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Entry limit of each local layer.
    pub local_capacity: usize,
    pub search_ttl: Duration,
    pub news_ttl: Duration,
    pub info_ttl: Duration,
}

impl CacheSettings {
    pub fn ttl(&self, namespace: CacheNamespace) -> Duration {
        match namespace {
            CacheNamespace::Search => self.search_ttl,
            CacheNamespace::News => self.news_ttl,
            CacheNamespace::Info => self.info_ttl,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            local_capacity: 500,
            search_ttl: Duration::hours(24),
            news_ttl: Duration::minutes(15),
            info_ttl: Duration::seconds(60),
        }
    }
}
