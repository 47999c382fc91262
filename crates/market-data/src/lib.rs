//! TickerHub Market Data Crate
//!
//! Vendor-facing half of TickerHub: the data shapes every provider returns,
//! the capability traits a vendor adapter implements, and the HTTP adapters
//! themselves.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +------------------+
//! |  ProviderRouter  | --> |  ProviderConfig  |  (base URI, key, limits)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! | Search/News/Info |  (capability traits)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  Vendor adapter  |  (Finnhub, Alpha Vantage, ...)
//! +------------------+
//! ```
//!
//! Adapters hold no credentials. The router hands each call the
//! [`ProviderConfig`] of the provider it selected, so a config refresh
//! takes effect on the next request without rebuilding adapters.
//!
//! # Core Types
//!
//! - [`Provider`] - Closed set of supported vendors
//! - [`Operation`] - `search`, `news` or `info`
//! - [`TickerSummary`], [`NewsItem`], [`QuoteInfo`] - Normalized results
//! - [`MarketDataError`] - Adapter failures

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::{
    LimitConfig, NewsItem, Operation, Provider, ProviderConfig, QuoteInfo, TickerSummary,
};
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::{InfoProvider, MarketDataProvider, NewsProvider, SearchProvider};
