//! Routing configuration: provider connection details and per-operation
//! priority rankings.

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};
use tickerhub_market_data::{Operation, Provider, ProviderConfig};

/// Operation -> provider -> rank. Lower rank wins.
///
/// A provider missing from an operation's table never serves it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriorityTable {
    ranks: HashMap<Operation, HashMap<Provider, i32>>,
}

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank(mut self, operation: Operation, provider: Provider, rank: i32) -> Self {
        self.set_rank(operation, provider, rank);
        self
    }

    pub fn set_rank(&mut self, operation: Operation, provider: Provider, rank: i32) {
        self.ranks.entry(operation).or_default().insert(provider, rank);
    }

    pub fn rank(&self, operation: Operation, provider: Provider) -> Option<i32> {
        self.ranks.get(&operation)?.get(&provider).copied()
    }

    /// Providers ranked for `operation`, best first. Ties break on provider order.
    pub fn ranked(&self, operation: Operation) -> Vec<Provider> {
        let mut ranked: Vec<(i32, Provider)> = self
            .ranks
            .get(&operation)
            .map(|table| table.iter().map(|(p, r)| (*r, *p)).collect())
            .unwrap_or_default();
        ranked.sort();
        ranked.into_iter().map(|(_, p)| p).collect()
    }
}

/// Immutable routing snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRoutingConfig", into = "RawRoutingConfig")]
pub struct RoutingConfig {
    pub providers: HashMap<Provider, ProviderConfig>,
    pub priorities: PriorityTable,
}

impl RoutingConfig {
    pub fn provider(&self, provider: Provider) -> Option<&ProviderConfig> {
        self.providers.get(&provider)
    }
}

/// Wire form of [`RoutingConfig`]. Keys stay strings so a document naming a
/// provider or operation this build does not know still loads.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoutingConfig {
    #[serde(default)]
    providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    priorities: BTreeMap<String, BTreeMap<String, i32>>,
}

impl From<RawRoutingConfig> for RoutingConfig {
    fn from(raw: RawRoutingConfig) -> Self {
        let mut providers = HashMap::new();
        for (id, config) in raw.providers {
            match id.parse::<Provider>() {
                Ok(provider) => {
                    providers.insert(provider, config);
                }
                Err(_) => warn!("Ignoring configuration for unknown provider '{}'", id),
            }
        }

        let mut priorities = PriorityTable::new();
        for (op, table) in raw.priorities {
            let Ok(operation) = op.parse::<Operation>() else {
                warn!("Ignoring priorities for unknown operation '{}'", op);
                continue;
            };
            for (id, rank) in table {
                match id.parse::<Provider>() {
                    Ok(provider) => priorities.set_rank(operation, provider, rank),
                    Err(_) => warn!("Ignoring {} priority for unknown provider '{}'", op, id),
                }
            }
        }

        Self {
            providers,
            priorities,
        }
    }
}

impl From<RoutingConfig> for RawRoutingConfig {
    fn from(config: RoutingConfig) -> Self {
        let providers = config
            .providers
            .into_iter()
            .map(|(p, c)| (p.id().to_string(), c))
            .collect();

        let priorities = config
            .priorities
            .ranks
            .into_iter()
            .map(|(op, table)| {
                let table = table
                    .into_iter()
                    .map(|(p, r)| (p.id().to_string(), r))
                    .collect();
                (op.as_str().to_string(), table)
            })
            .collect();

        Self {
            providers,
            priorities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "providers": {
            "FINNHUB": {
                "baseUri": "https://finnhub.io/api/v1",
                "apiKey": "fh-key",
                "limit": { "perMinute": 60 }
            },
            "ALPHA_VANTAGE": {
                "baseUri": "https://www.alphavantage.co/query",
                "limit": { "perDay": 25, "perMonth": 500 }
            },
            "YAHOO": { "baseUri": "https://query1.finance.yahoo.com" }
        },
        "priorities": {
            "search": { "FINNHUB": 1, "ALPHA_VANTAGE": 2 },
            "news": { "ALPHA_VANTAGE": 1, "FINNHUB": 2, "YAHOO": 0 },
            "quotes": { "FINNHUB": 1 }
        }
    }"#;

    #[test]
    fn test_parse_skips_unknown_ids() {
        let config: RoutingConfig = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(config.providers.len(), 2);
        let av = config.provider(Provider::AlphaVantage).unwrap();
        assert_eq!(av.limit.per_day, Some(25));
        assert_eq!(av.api_key, "");
        assert_eq!(
            config.priorities.ranked(Operation::News),
            vec![Provider::AlphaVantage, Provider::Finnhub]
        );
        assert!(config.priorities.ranked(Operation::Info).is_empty());
    }

    #[test]
    fn test_ranked_orders_by_rank() {
        let table = PriorityTable::new()
            .with_rank(Operation::Info, Provider::Polygon, 3)
            .with_rank(Operation::Info, Provider::Finnhub, 1)
            .with_rank(Operation::Info, Provider::TwelveData, 2);

        assert_eq!(
            table.ranked(Operation::Info),
            vec![Provider::Finnhub, Provider::TwelveData, Provider::Polygon]
        );
        assert_eq!(table.rank(Operation::Info, Provider::Polygon), Some(3));
        assert_eq!(table.rank(Operation::Search, Provider::Polygon), None);
    }

    #[test]
    fn test_serialize_uses_provider_ids() {
        let config: RoutingConfig = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["priorities"]["search"]["FINNHUB"], 1);
        assert_eq!(json["providers"]["FINNHUB"]["limit"]["perMinute"], 60);

        let reparsed: RoutingConfig = serde_json::from_value(json).unwrap();
        assert_eq!(reparsed, config);
    }
}
