//! Finnhub market data provider implementation.
//!
//! This module provides market data from Finnhub API:
//! - Symbol search via /search endpoint
//! - Company news via /company-news endpoint (one symbol per call)
//! - Latest quotes via /quote endpoint (one symbol per call)
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{NewsItem, Provider, ProviderConfig, QuoteInfo, TickerSummary};
use crate::provider::{InfoProvider, MarketDataProvider, NewsProvider, SearchProvider};

const PROVIDER_ID: &str = "FINNHUB";

/// Default API root, used when a deployment does not override `baseUri`.
pub const DEFAULT_BASE_URI: &str = "https://finnhub.io/api/v1";

/// How far back /company-news looks.
const NEWS_LOOKBACK_DAYS: i64 = 7;

/// Articles kept per symbol.
const MAX_NEWS_PER_SYMBOL: usize = 20;

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close
    pc: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
}

/// Response from /search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchItem>,
}

/// Individual search result item
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    /// Full description/name
    description: String,
    /// Display symbol
    display_symbol: String,
    /// Symbol for API calls
    symbol: String,
    /// Security type (e.g., "Common Stock", "ETF")
    #[serde(rename = "type")]
    security_type: String,
}

/// Item of the /company-news array
#[derive(Debug, Deserialize)]
struct NewsArticle {
    /// Publication time (Unix)
    datetime: i64,
    headline: String,
    #[serde(default)]
    image: Option<String>,
    /// Comma separated related symbols
    #[serde(default)]
    related: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    url: String,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
///
/// Supports search, news and latest quotes. News and quotes accept a single
/// symbol per HTTP call, so multi-symbol requests fan out sequentially.
pub struct FinnhubProvider {
    client: Client,
}

impl FinnhubProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(
        &self,
        config: &ProviderConfig,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, MarketDataError> {
        let url = format!("{}{}", config.base(), endpoint);

        // API key goes in a header, never in the logged URL
        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &config.api_key)
            .query(params);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        // Finnhub answers 401 for a bad key and 403 for endpoints outside the plan
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(error_msg) = error_resp.error {
                    return Err(MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: error_msg,
                    });
                }
            }

            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }

    async fn search_symbols(
        &self,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<Vec<TickerSummary>, MarketDataError> {
        let text = self.fetch(config, "/search", &[("q", query)]).await?;
        let response: SearchResponse = parse(&text, "search")?;

        let results: Vec<TickerSummary> = response
            .result
            .into_iter()
            .map(|item| {
                TickerSummary::new(item.symbol, item.description)
                    .with_exchange(item.display_symbol)
                    .with_asset_type(map_security_type(&item.security_type))
            })
            .collect();

        debug!("Finnhub: found {} search results for '{}'", results.len(), query);
        Ok(results)
    }

    async fn fetch_company_news(
        &self,
        config: &ProviderConfig,
        symbol: &str,
    ) -> Result<Vec<NewsItem>, MarketDataError> {
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(NEWS_LOOKBACK_DAYS);
        let from_str = from.format("%Y-%m-%d").to_string();
        let to_str = to.format("%Y-%m-%d").to_string();

        let params = [("symbol", symbol), ("from", &from_str), ("to", &to_str)];
        let text = self.fetch(config, "/company-news", &params).await?;
        let articles: Vec<NewsArticle> = parse(&text, "company-news")?;

        let items = articles
            .into_iter()
            .filter_map(|article| map_article(article, symbol))
            .take(MAX_NEWS_PER_SYMBOL)
            .collect::<Vec<_>>();

        debug!("Finnhub: fetched {} news items for {}", items.len(), symbol);
        Ok(items)
    }

    async fn fetch_latest_quote(
        &self,
        config: &ProviderConfig,
        symbol: &str,
    ) -> Result<Option<QuoteInfo>, MarketDataError> {
        let text = self.fetch(config, "/quote", &[("symbol", symbol)]).await?;
        let response: QuoteResponse = parse(&text, "quote")?;

        let close = match response.c {
            Some(c) => c,
            None => return Ok(None),
        };

        // Finnhub returns zeros for unknown symbols instead of an error
        if close == 0.0 && response.o.unwrap_or(0.0) == 0.0 {
            debug!("Finnhub: no trading data for {}", symbol);
            return Ok(None);
        }

        let price = Decimal::try_from(close).map_err(|_| MarketDataError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            message: format!("Invalid price: {}", close),
        })?;

        let timestamp = response
            .t
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        let mut quote = QuoteInfo::new(symbol, price, timestamp, PROVIDER_ID);
        quote.open = to_decimal(response.o);
        quote.high = to_decimal(response.h);
        quote.low = to_decimal(response.l);
        quote.previous_close = to_decimal(response.pc);
        quote.change = to_decimal(response.d);
        quote.change_percent = to_decimal(response.dp);
        quote.currency = Some("USD".to_string());

        Ok(Some(quote))
    }
}

impl Default for FinnhubProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Capability Implementations
// ============================================================================

impl MarketDataProvider for FinnhubProvider {
    fn provider(&self) -> Provider {
        Provider::Finnhub
    }
}

#[async_trait]
impl SearchProvider for FinnhubProvider {
    async fn search(
        &self,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<Vec<TickerSummary>, MarketDataError> {
        match self.search_symbols(config, query).await {
            Err(e) if e.is_recoverable() => {
                warn!("Finnhub search degraded to empty result: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

#[async_trait]
impl NewsProvider for FinnhubProvider {
    async fn news(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, Vec<NewsItem>>, MarketDataError> {
        let mut result = HashMap::new();

        for symbol in tickers {
            match self.fetch_company_news(config, symbol).await {
                Ok(items) => {
                    result.insert(symbol.clone(), items);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Finnhub news stopped at {}: {}", symbol, e);
                    break;
                }
                Err(e) if result.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "Finnhub news failed for {} after {} symbols, returning partial result: {}",
                        symbol,
                        result.len(),
                        e
                    );
                    break;
                }
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl InfoProvider for FinnhubProvider {
    async fn info(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, QuoteInfo>, MarketDataError> {
        let mut result = HashMap::new();

        for symbol in tickers {
            match self.fetch_latest_quote(config, symbol).await {
                Ok(Some(quote)) => {
                    result.insert(symbol.clone(), quote);
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Finnhub quotes stopped at {}: {}", symbol, e);
                    break;
                }
                Err(e) if result.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "Finnhub quote failed for {} after {} symbols, returning partial result: {}",
                        symbol,
                        result.len(),
                        e
                    );
                    break;
                }
            }
        }

        Ok(result)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse<T: serde::de::DeserializeOwned>(text: &str, endpoint: &str) -> Result<T, MarketDataError> {
    serde_json::from_str(text).map_err(|e| MarketDataError::InvalidResponse {
        provider: PROVIDER_ID.to_string(),
        message: format!("Failed to parse {} response: {}", endpoint, e),
    })
}

fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(|v| Decimal::try_from(v).ok())
}

fn map_article(article: NewsArticle, symbol: &str) -> Option<NewsItem> {
    let published_at = Utc.timestamp_opt(article.datetime, 0).single()?;

    let mut tickers: Vec<String> = article
        .related
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !tickers.iter().any(|t| t == symbol) {
        tickers.push(symbol.to_string());
    }

    Some(NewsItem {
        title: article.headline,
        url: article.url,
        published_at,
        summary: article.summary.filter(|s| !s.is_empty()),
        source: article.source,
        image_url: article.image.filter(|s| !s.is_empty()),
        tickers,
    })
}

/// Map Finnhub security type to our asset type.
fn map_security_type(finnhub_type: &str) -> String {
    match finnhub_type.to_lowercase().as_str() {
        "common stock" | "stock" => "Stock".to_string(),
        "etf" | "etp" => "ETF".to_string(),
        "mutual fund" | "fund" => "Mutual Fund".to_string(),
        "adr" | "american depositary receipt" => "ADR".to_string(),
        "reit" => "REIT".to_string(),
        "preferred stock" | "preferred" => "Preferred Stock".to_string(),
        _ => finnhub_type.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let provider = FinnhubProvider::new();
        assert_eq!(provider.provider(), Provider::Finnhub);
        assert_eq!(provider.provider().id(), PROVIDER_ID);
    }

    #[test]
    fn test_map_security_type() {
        assert_eq!(map_security_type("Common Stock"), "Stock");
        assert_eq!(map_security_type("ETF"), "ETF");
        assert_eq!(map_security_type("ADR"), "ADR");
        assert_eq!(map_security_type("Unknown Type"), "Unknown Type");
    }

    #[test]
    fn test_quote_response_parsing() {
        let json = r#"{
            "c": 150.25,
            "d": 1.50,
            "dp": 1.01,
            "h": 152.00,
            "l": 148.50,
            "o": 149.00,
            "pc": 148.75,
            "t": 1704067200
        }"#;

        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.c, Some(150.25));
        assert_eq!(response.pc, Some(148.75));
        assert_eq!(response.dp, Some(1.01));
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "count": 2,
            "result": [
                {
                    "description": "Apple Inc",
                    "displaySymbol": "AAPL",
                    "symbol": "AAPL",
                    "type": "Common Stock"
                },
                {
                    "description": "Apple Hospitality REIT Inc",
                    "displaySymbol": "APLE",
                    "symbol": "APLE",
                    "type": "REIT"
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.result.len(), 2);
        assert_eq!(response.result[0].symbol, "AAPL");
        assert_eq!(response.result[1].security_type, "REIT");
    }

    #[test]
    fn test_news_article_mapping() {
        let json = r#"[{
            "category": "company",
            "datetime": 1704067200,
            "headline": "Apple unveils new product",
            "id": 1234,
            "image": "",
            "related": "AAPL",
            "source": "Reuters",
            "summary": "Summary text",
            "url": "https://example.com/a"
        }]"#;

        let articles: Vec<NewsArticle> = serde_json::from_str(json).unwrap();
        let item = map_article(articles.into_iter().next().unwrap(), "AAPL").unwrap();
        assert_eq!(item.title, "Apple unveils new product");
        assert_eq!(item.tickers, vec!["AAPL".to_string()]);
        assert!(item.image_url.is_none());
        assert_eq!(item.source.as_deref(), Some("Reuters"));
    }

    #[test]
    fn test_news_article_adds_requested_symbol() {
        let article = NewsArticle {
            datetime: 1704067200,
            headline: "Markets".to_string(),
            image: None,
            related: Some("MSFT, GOOG".to_string()),
            source: None,
            summary: None,
            url: "https://example.com/b".to_string(),
        };
        let item = map_article(article, "AAPL").unwrap();
        assert_eq!(item.tickers, vec!["MSFT", "GOOG", "AAPL"]);
    }
}
