use async_trait::async_trait;
use tickerhub_market_data::Provider;

use super::LimitUsage;
use crate::errors::Result;

/// Read-modify-write step applied to one provider's usage record.
///
/// Receives the stored usage (default when none exists). Returning `None`
/// aborts the write and leaves the record untouched.
pub type UsageUpdate = Box<dyn FnOnce(LimitUsage) -> Option<LimitUsage> + Send>;

/// Persistent store of per-provider quota usage.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn get_usage(&self, provider: Provider) -> Result<Option<LimitUsage>>;

    /// Runs `update` against the provider's record inside one transaction.
    /// Concurrent updates for the same provider are serialized.
    ///
    /// Returns the written usage, or `None` when `update` declined.
    async fn update_usage(&self, provider: Provider, update: UsageUpdate) -> Result<Option<LimitUsage>>;

    async fn reset_usage(&self, provider: Provider) -> Result<()>;

    async fn reset_all_usage(&self) -> Result<()>;

    /// Every stored record. Rows naming an unknown provider are skipped.
    async fn get_all_usage(&self) -> Result<Vec<(Provider, LimitUsage)>>;
}
