use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickerhub_market_data::Provider;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Selection,
    Failure,
}

/// One routing outcome, as sent to the stats worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsEvent {
    pub provider: Provider,
    pub kind: StatKind,
    pub at: DateTime<Utc>,
}

/// Accumulated counters for one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub provider: Provider,
    pub selections: u64,
    pub failures: u64,
    pub last_selected_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl ProviderStats {
    pub fn empty(provider: Provider) -> Self {
        Self {
            provider,
            selections: 0,
            failures: 0,
            last_selected_at: None,
            last_failure_at: None,
        }
    }

    pub fn apply(&mut self, kind: StatKind, at: DateTime<Utc>) {
        match kind {
            StatKind::Selection => {
                self.selections += 1;
                self.last_selected_at = Some(at);
            }
            StatKind::Failure => {
                self.failures += 1;
                self.last_failure_at = Some(at);
            }
        }
    }
}
