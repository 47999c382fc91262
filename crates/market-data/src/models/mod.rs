//! Market data models
//!
//! This module contains the shared data types for routed operations:
//! - `types` - Provider and Operation identities
//! - `search` - Search result data (TickerSummary)
//! - `news` - News articles (NewsItem)
//! - `quote` - Latest quote data (QuoteInfo)
//! - `config` - Per-provider connection and quota policy (ProviderConfig, LimitConfig)

mod config;
mod news;
mod quote;
mod search;
mod types;

pub use config::{LimitConfig, ProviderConfig};
pub use news::NewsItem;
pub use quote::QuoteInfo;
pub use search::TickerSummary;
pub use types::{Operation, Provider};
