//! Capability-typed provider traits.
//!
//! A vendor adapter implements [`MarketDataProvider`] for its identity and
//! then any subset of [`SearchProvider`], [`NewsProvider`] and
//! [`InfoProvider`]. There is no single interface every vendor must fill in;
//! the router only ever asks an adapter for an operation it registered for.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{NewsItem, Provider, ProviderConfig, QuoteInfo, TickerSummary};

/// Identity shared by every provider adapter.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tickerhub_market_data::provider::{MarketDataProvider, SearchProvider};
///
/// struct MyProvider;
///
/// impl MarketDataProvider for MyProvider {
///     fn provider(&self) -> Provider {
///         Provider::Polygon
///     }
/// }
///
/// #[async_trait]
/// impl SearchProvider for MyProvider {
///     async fn search(&self, config: &ProviderConfig, query: &str)
///         -> Result<Vec<TickerSummary>, MarketDataError> {
///         // ... vendor call
///     }
/// }
/// ```
pub trait MarketDataProvider: Send + Sync {
    /// Vendor behind this adapter.
    fn provider(&self) -> Provider;
}

/// Symbol search capability.
#[async_trait]
pub trait SearchProvider: MarketDataProvider {
    /// Search for tickers matching `query`.
    ///
    /// `config` is the provider's current config snapshot; adapters must not
    /// cache keys or base URIs across calls.
    async fn search(
        &self,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<Vec<TickerSummary>, MarketDataError>;
}

/// News capability.
#[async_trait]
pub trait NewsProvider: MarketDataProvider {
    /// Fetch news for the given tickers.
    ///
    /// The returned map may cover only a subset of `tickers` (vendors that
    /// accept one symbol per call, partial answers); symbols with no entry
    /// are simply absent.
    async fn news(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, Vec<NewsItem>>, MarketDataError>;
}

/// Latest quote capability.
#[async_trait]
pub trait InfoProvider: MarketDataProvider {
    /// Fetch the latest quote for the given tickers.
    ///
    /// Same subset semantics as [`NewsProvider::news`].
    async fn info(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, QuoteInfo>, MarketDataError>;
}
