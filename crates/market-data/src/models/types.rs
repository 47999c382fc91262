use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of an external market data vendor.
///
/// The set is closed: every vendor the service can talk to is listed here,
/// whether or not an adapter is registered for it in a given deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    Finnhub,
    AlphaVantage,
    Polygon,
    TwelveData,
    FinancialModelingPrep,
    Marketaux,
    Stockdata,
}

impl Provider {
    pub const ALL: [Provider; 7] = [
        Provider::Finnhub,
        Provider::AlphaVantage,
        Provider::Polygon,
        Provider::TwelveData,
        Provider::FinancialModelingPrep,
        Provider::Marketaux,
        Provider::Stockdata,
    ];

    /// Stable identifier used in config files, storage rows and logs.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Finnhub => "FINNHUB",
            Provider::AlphaVantage => "ALPHA_VANTAGE",
            Provider::Polygon => "POLYGON",
            Provider::TwelveData => "TWELVE_DATA",
            Provider::FinancialModelingPrep => "FINANCIAL_MODELING_PREP",
            Provider::Marketaux => "MARKETAUX",
            Provider::Stockdata => "STOCKDATA",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.id() == normalized)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Logical request kind routed to providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Search,
    News,
    Info,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Search, Operation::News, Operation::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::News => "news",
            Operation::Info => "info",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(Operation::Search),
            "news" => Ok(Operation::News),
            "info" => Ok(Operation::Info),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}
