use chrono::Utc;
use diesel::prelude::*;

use crate::utils::{format_timestamp, parse_timestamp};
use tickerhub_core::quota::LimitUsage;

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::provider_usage)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProviderUsageDB {
    pub provider: String,
    pub last_used_at: Option<String>,
    pub used_count: i32,
    pub updated_at: String,
}

impl ProviderUsageDB {
    pub fn from_usage(provider: &str, usage: &LimitUsage) -> Self {
        Self {
            provider: provider.to_string(),
            last_used_at: usage.last_used_at.map(format_timestamp),
            used_count: i32::try_from(usage.used_count).unwrap_or(i32::MAX),
            updated_at: format_timestamp(Utc::now()),
        }
    }
}

impl From<ProviderUsageDB> for LimitUsage {
    fn from(db: ProviderUsageDB) -> Self {
        Self {
            last_used_at: parse_timestamp("last_used_at", db.last_used_at.as_deref()),
            used_count: u32::try_from(db.used_count).unwrap_or(0),
        }
    }
}
