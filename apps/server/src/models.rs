use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickerhub_core::quota::QuotaStatus;
use tickerhub_market_data::Provider;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `?tickers=AAPL,MSFT`
#[derive(Deserialize, Debug)]
pub struct TickersQuery {
    #[serde(default)]
    pub tickers: String,
}

impl TickersQuery {
    pub fn symbols(&self) -> Vec<String> {
        self.tickers
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuota {
    pub provider: Provider,
    pub used_count: u32,
    pub last_used_at: Option<DateTime<Utc>>,
    /// `None` for providers without any ceiling.
    pub remaining: Option<u32>,
    pub available: bool,
}

impl From<QuotaStatus> for ProviderQuota {
    fn from(status: QuotaStatus) -> Self {
        Self {
            provider: status.provider,
            used_count: status.usage.used_count,
            last_used_at: status.usage.last_used_at,
            remaining: status.remaining,
            available: status.available,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub providers: Vec<Provider>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_path: String,
    pub configured_providers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickers_query_splits_and_trims() {
        let query = TickersQuery {
            tickers: " aapl, ,MSFT,".to_string(),
        };
        assert_eq!(query.symbols(), vec!["aapl".to_string(), "MSFT".to_string()]);
        assert!(TickersQuery { tickers: String::new() }.symbols().is_empty());
    }
}
