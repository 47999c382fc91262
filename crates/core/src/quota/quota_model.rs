use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickerhub_market_data::Provider;

/// Live quota state for one provider.
///
/// A single counter backs every configured window; it restarts whenever any
/// configured window rolls over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitUsage {
    pub last_used_at: Option<DateTime<Utc>>,
    pub used_count: u32,
}

impl LimitUsage {
    pub fn new(last_used_at: DateTime<Utc>, used_count: u32) -> Self {
        Self {
            last_used_at: Some(last_used_at),
            used_count,
        }
    }
}

/// Calendar bucket size of a quota window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Day,
    Month,
}

/// Quota state of one provider as reported to administrators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub provider: Provider,
    pub usage: LimitUsage,
    /// `None` when the provider has no ceiling.
    pub remaining: Option<u32>,
    pub available: bool,
}
