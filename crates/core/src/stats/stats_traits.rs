use async_trait::async_trait;
use tickerhub_market_data::Provider;

use super::{ProviderStats, StatsEvent};
use crate::errors::Result;

/// Fire-and-forget receiver of routing outcomes.
///
/// Implementations must return immediately and never fail the caller.
pub trait StatsSink: Send + Sync {
    fn record_selection(&self, provider: Provider);

    fn record_failure(&self, provider: Provider);
}

/// Persistent per-provider counters.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn record(&self, event: StatsEvent) -> Result<()>;

    /// Rows naming an unknown provider are skipped.
    async fn all_stats(&self) -> Result<Vec<ProviderStats>>;
}
