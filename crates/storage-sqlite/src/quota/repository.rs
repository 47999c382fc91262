use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::str::FromStr;
use std::sync::Arc;

use super::model::ProviderUsageDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::provider_usage::dsl;
use tickerhub_core::quota::{LimitUsage, QuotaStore, UsageUpdate};
use tickerhub_core::Result;
use tickerhub_market_data::Provider;

/// [`QuotaStore`] over the `provider_usage` table.
///
/// Updates run on the writer actor inside `BEGIN IMMEDIATE`, so the
/// read-check-write of a claim holds SQLite's write lock end to end. Two
/// processes sharing the file cannot both claim the last unit.
pub struct SqliteQuotaStore {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SqliteQuotaStore {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn get_usage(&self, provider: Provider) -> Result<Option<LimitUsage>> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::provider_usage
            .find(provider.id())
            .select(ProviderUsageDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(LimitUsage::from))
    }

    async fn update_usage(
        &self,
        provider: Provider,
        update: UsageUpdate,
    ) -> Result<Option<LimitUsage>> {
        self.writer
            .exec(move |conn| {
                let current = dsl::provider_usage
                    .find(provider.id())
                    .select(ProviderUsageDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .map(LimitUsage::from)
                    .unwrap_or_default();

                let Some(next) = update(current) else {
                    return Ok(None);
                };

                diesel::replace_into(dsl::provider_usage)
                    .values(ProviderUsageDB::from_usage(provider.id(), &next))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Some(next))
            })
            .await
    }

    async fn reset_usage(&self, provider: Provider) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::delete(dsl::provider_usage.find(provider.id()))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn reset_all_usage(&self) -> Result<()> {
        self.writer
            .exec(|conn| {
                diesel::delete(dsl::provider_usage)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn get_all_usage(&self) -> Result<Vec<(Provider, LimitUsage)>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::provider_usage
            .order(dsl::provider.asc())
            .select(ProviderUsageDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match Provider::from_str(&row.provider) {
                Ok(provider) => Some((provider, LimitUsage::from(row))),
                Err(_) => {
                    warn!("Skipping quota usage for unknown provider '{}'", row.provider);
                    None
                }
            })
            .collect())
    }
}
