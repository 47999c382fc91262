//! Alpha Vantage market data provider implementation.
//!
//! This module provides market data from Alpha Vantage API:
//! - Symbol search via SYMBOL_SEARCH
//! - News and sentiment via NEWS_SENTIMENT (many tickers per call)
//! - Latest quotes via GLOBAL_QUOTE (one symbol per call)
//!
//! Note: Alpha Vantage free tier is limited to 25 API calls per day.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{NewsItem, Provider, ProviderConfig, QuoteInfo, TickerSummary};
use crate::provider::{InfoProvider, MarketDataProvider, NewsProvider, SearchProvider};

/// Default API root, used when a deployment does not override `baseUri`.
pub const DEFAULT_BASE_URI: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Articles requested from NEWS_SENTIMENT per call.
const NEWS_LIMIT: &str = "50";

/// Alpha Vantage market data provider.
///
/// News is fetched for all tickers in one call; quotes need one call per symbol.
pub struct AlphaVantageProvider {
    client: Client,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// Fields Alpha Vantage adds to any response when the call was refused.
#[derive(Debug, Default, Deserialize)]
struct ApiNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// SYMBOL_SEARCH response
#[derive(Debug, Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<SymbolMatch>>,
    #[serde(flatten)]
    notice: ApiNotice,
}

#[derive(Debug, Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "3. type")]
    asset_type: Option<String>,
    #[serde(rename = "4. region")]
    region: Option<String>,
    #[serde(rename = "8. currency")]
    currency: Option<String>,
}

/// NEWS_SENTIMENT response
#[derive(Debug, Deserialize)]
struct NewsSentimentResponse {
    feed: Option<Vec<FeedArticle>>,
    #[serde(flatten)]
    notice: ApiNotice,
}

#[derive(Debug, Deserialize)]
struct FeedArticle {
    title: String,
    url: String,
    /// Format: 20240115T123000
    time_published: String,
    summary: Option<String>,
    banner_image: Option<String>,
    source: Option<String>,
    #[serde(default)]
    ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct TickerSentiment {
    ticker: String,
}

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
    #[serde(flatten)]
    notice: ApiNotice,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

impl AlphaVantageProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(
        &self,
        config: &ProviderConfig,
        params: &[(&str, &str)],
    ) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &config.api_key));

        let url = reqwest::Url::parse_with_params(config.base(), &all_params).map_err(|e| {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            }
        })?;

        debug!("Alpha Vantage request: {}", masked(url.as_str(), &config.api_key));

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: masked(&e.to_string(), &config.api_key),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })
    }

    async fn search_symbols(
        &self,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<Vec<TickerSummary>, MarketDataError> {
        let params = [("function", "SYMBOL_SEARCH"), ("keywords", query)];
        let text = self.fetch(config, &params).await?;
        let response: SymbolSearchResponse = parse(&text, "SYMBOL_SEARCH")?;
        Self::check_api_error(&response.notice)?;

        let results: Vec<TickerSummary> = response
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                let mut summary = TickerSummary::new(m.symbol, m.name);
                summary.exchange = m.region;
                summary.asset_type = m.asset_type;
                summary.currency = m.currency;
                summary
            })
            .collect();

        debug!("Alpha Vantage: found {} matches for '{}'", results.len(), query);
        Ok(results)
    }

    async fn fetch_news(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, Vec<NewsItem>>, MarketDataError> {
        let joined = tickers.join(",");
        let params = [
            ("function", "NEWS_SENTIMENT"),
            ("tickers", joined.as_str()),
            ("limit", NEWS_LIMIT),
        ];
        let text = self.fetch(config, &params).await?;
        let response: NewsSentimentResponse = parse(&text, "NEWS_SENTIMENT")?;
        Self::check_api_error(&response.notice)?;

        Ok(group_feed_by_ticker(response.feed.unwrap_or_default(), tickers))
    }

    async fn fetch_global_quote(
        &self,
        config: &ProviderConfig,
        symbol: &str,
    ) -> Result<Option<QuoteInfo>, MarketDataError> {
        let params = [("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        let text = self.fetch(config, &params).await?;
        let response: GlobalQuoteResponse = parse(&text, "GLOBAL_QUOTE")?;
        Self::check_api_error(&response.notice)?;

        Ok(response.quote.and_then(|q| q.into_quote_info(symbol)))
    }

    /// Check for API-level errors in the response.
    fn check_api_error(notice: &ApiNotice) -> Result<(), MarketDataError> {
        if let Some(ref msg) = notice.error_message {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        // "Note" usually indicates rate limiting
        if let Some(ref msg) = notice.note {
            if is_rate_limit_message(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage note: {}", msg);
        }

        // "Information" can indicate various issues
        if let Some(ref msg) = notice.information {
            if is_rate_limit_message(msg) {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            if msg.contains("apikey") || msg.contains("API key") {
                return Err(MarketDataError::Unauthorized {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage info: {}", msg);
        }

        Ok(())
    }
}

impl Default for AlphaVantageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalQuote {
    fn into_quote_info(self, requested: &str) -> Option<QuoteInfo> {
        // An unknown symbol comes back as an empty "Global Quote" object
        let price = self.price.as_deref().and_then(parse_decimal)?;
        let timestamp = self
            .latest_trading_day
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(Utc::now);
        let symbol = self.symbol.unwrap_or_else(|| requested.to_string());

        let mut quote = QuoteInfo::new(symbol, price, timestamp, PROVIDER_ID);
        quote.open = self.open.as_deref().and_then(parse_decimal);
        quote.high = self.high.as_deref().and_then(parse_decimal);
        quote.low = self.low.as_deref().and_then(parse_decimal);
        quote.previous_close = self.previous_close.as_deref().and_then(parse_decimal);
        quote.change = self.change.as_deref().and_then(parse_decimal);
        quote.change_percent = self
            .change_percent
            .as_deref()
            .and_then(|s| parse_decimal(s.trim_end_matches('%')));
        quote.volume = self.volume.as_deref().and_then(parse_decimal);
        Some(quote)
    }
}

// ============================================================================
// Capability Implementations
// ============================================================================

impl MarketDataProvider for AlphaVantageProvider {
    fn provider(&self) -> Provider {
        Provider::AlphaVantage
    }
}

#[async_trait]
impl SearchProvider for AlphaVantageProvider {
    async fn search(
        &self,
        config: &ProviderConfig,
        query: &str,
    ) -> Result<Vec<TickerSummary>, MarketDataError> {
        match self.search_symbols(config, query).await {
            Err(e) if e.is_recoverable() => {
                warn!("Alpha Vantage search degraded to empty result: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

#[async_trait]
impl NewsProvider for AlphaVantageProvider {
    async fn news(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, Vec<NewsItem>>, MarketDataError> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }

        match self.fetch_news(config, tickers).await {
            Err(e) if e.is_recoverable() => {
                warn!("Alpha Vantage news degraded to empty result: {}", e);
                Ok(HashMap::new())
            }
            other => other,
        }
    }
}

#[async_trait]
impl InfoProvider for AlphaVantageProvider {
    async fn info(
        &self,
        config: &ProviderConfig,
        tickers: &[String],
    ) -> Result<HashMap<String, QuoteInfo>, MarketDataError> {
        let mut result = HashMap::new();

        for symbol in tickers {
            match self.fetch_global_quote(config, symbol).await {
                Ok(Some(quote)) => {
                    result.insert(symbol.clone(), quote);
                }
                Ok(None) => debug!("Alpha Vantage: no quote for {}", symbol),
                Err(e) if e.is_recoverable() => {
                    warn!("Alpha Vantage quotes stopped at {}: {}", symbol, e);
                    break;
                }
                Err(e) if result.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        "Alpha Vantage quote failed for {} after {} symbols, returning partial result: {}",
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

fn parse<T: serde::de::DeserializeOwned>(text: &str, function: &str) -> Result<T, MarketDataError> {
    serde_json::from_str(text).map_err(|e| MarketDataError::InvalidResponse {
        provider: PROVIDER_ID.to_string(),
        message: format!("Failed to parse {} response: {}", function, e),
    })
}

fn masked(text: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "***")
    }
}

fn is_rate_limit_message(msg: &str) -> bool {
    msg.contains("API call frequency") || msg.contains("rate limit")
}

/// Parse a date string in YYYY-MM-DD format to DateTime<Utc>.
fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
}

/// Parse NEWS_SENTIMENT timestamps (`20240115T123000`, seconds optional).
fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M"))
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Distribute feed articles to the requested tickers they mention.
fn group_feed_by_ticker(
    feed: Vec<FeedArticle>,
    tickers: &[String],
) -> HashMap<String, Vec<NewsItem>> {
    let mut grouped: HashMap<String, Vec<NewsItem>> = HashMap::new();

    for article in feed {
        let Some(published_at) = parse_published(&article.time_published) else {
            warn!(
                "Alpha Vantage: skipping article with bad timestamp '{}'",
                article.time_published
            );
            continue;
        };

        let mentioned: Vec<String> = article
            .ticker_sentiment
            .iter()
            .map(|t| t.ticker.clone())
            .collect();

        let item = NewsItem {
            title: article.title,
            url: article.url,
            published_at,
            summary: article.summary.filter(|s| !s.is_empty()),
            source: article.source,
            image_url: article.banner_image.filter(|s| !s.is_empty()),
            tickers: mentioned.clone(),
        };

        for ticker in tickers {
            if mentioned.iter().any(|m| m.eq_ignore_ascii_case(ticker)) {
                grouped.entry(ticker.clone()).or_default().push(item.clone());
            }
        }
    }

    grouped
}
