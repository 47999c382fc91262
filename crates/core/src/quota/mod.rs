//! Per-provider usage quotas with calendar-aligned windows.

mod memory_store;
mod quota_model;
pub mod quota_policy;
mod quota_service;
mod quota_traits;

pub use memory_store::InMemoryQuotaStore;
pub use quota_model::{Granularity, LimitUsage, QuotaStatus};
pub use quota_service::QuotaTracker;
pub use quota_traits::{QuotaStore, UsageUpdate};
