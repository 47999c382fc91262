use diesel::prelude::*;

use crate::utils::{format_timestamp, parse_timestamp};
use tickerhub_core::stats::ProviderStats;
use tickerhub_market_data::Provider;

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::provider_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProviderStatsDB {
    pub provider: String,
    pub selections: i64,
    pub failures: i64,
    pub last_selected_at: Option<String>,
    pub last_failure_at: Option<String>,
}

impl ProviderStatsDB {
    pub fn into_stats(self, provider: Provider) -> ProviderStats {
        ProviderStats {
            provider,
            selections: u64::try_from(self.selections).unwrap_or(0),
            failures: u64::try_from(self.failures).unwrap_or(0),
            last_selected_at: parse_timestamp("last_selected_at", self.last_selected_at.as_deref()),
            last_failure_at: parse_timestamp("last_failure_at", self.last_failure_at.as_deref()),
        }
    }
}

impl From<&ProviderStats> for ProviderStatsDB {
    fn from(stats: &ProviderStats) -> Self {
        Self {
            provider: stats.provider.id().to_string(),
            selections: i64::try_from(stats.selections).unwrap_or(i64::MAX),
            failures: i64::try_from(stats.failures).unwrap_or(i64::MAX),
            last_selected_at: stats.last_selected_at.map(format_timestamp),
            last_failure_at: stats.last_failure_at.map(format_timestamp),
        }
    }
}
