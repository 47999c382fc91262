use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::str::FromStr;
use std::sync::Arc;

use super::model::ProviderStatsDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::provider_stats::dsl;
use tickerhub_core::stats::{ProviderStats, StatsEvent, StatsStore};
use tickerhub_core::Result;
use tickerhub_market_data::Provider;

pub struct SqliteStatsStore {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SqliteStatsStore {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
    async fn record(&self, event: StatsEvent) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let mut stats = dsl::provider_stats
                    .find(event.provider.id())
                    .select(ProviderStatsDB::as_select())
                    .first(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .map(|row| row.into_stats(event.provider))
                    .unwrap_or_else(|| ProviderStats::empty(event.provider));

                stats.apply(event.kind, event.at);

                diesel::replace_into(dsl::provider_stats)
                    .values(ProviderStatsDB::from(&stats))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn all_stats(&self) -> Result<Vec<ProviderStats>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::provider_stats
            .order(dsl::provider.asc())
            .select(ProviderStatsDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match Provider::from_str(&row.provider) {
                Ok(provider) => Some(row.into_stats(provider)),
                Err(_) => {
                    warn!("Skipping stats for unknown provider '{}'", row.provider);
                    None
                }
            })
            .collect())
    }
}
