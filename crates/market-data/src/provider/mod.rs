//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The capability traits (`SearchProvider`, `NewsProvider`, `InfoProvider`)
//! - Concrete vendor adapters (Finnhub, Alpha Vantage)
//!
//! Adapters are thin translators between a vendor JSON shape and the shared
//! models. Quota accounting, caching and provider selection live outside of
//! them.

mod traits;

pub mod alpha_vantage;
pub mod finnhub;

pub use traits::{InfoProvider, MarketDataProvider, NewsProvider, SearchProvider};
