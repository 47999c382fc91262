use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article attached to one or more ticker symbols.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Publisher name as reported by the vendor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Symbols the vendor associated with the article
    #[serde(default)]
    pub tickers: Vec<String>,
}
