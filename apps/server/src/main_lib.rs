use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use tickerhub_core::{
    cache::{CacheJanitor, DurableStore},
    quota::{QuotaStore, QuotaTracker},
    routing::{ConfigSource, JsonFileConfigSource, RoutingConfig, RoutingSettings},
    stats::{spawn_stats_worker, StatsStore},
    Clock, ProviderAdapters, ProviderRouter, RouterCaches, SystemClock,
};
use tickerhub_market_data::{AlphaVantageProvider, FinnhubProvider};
use tickerhub_storage_sqlite::{
    db::{self, write_actor},
    SqliteCacheStore, SqliteQuotaStore, SqliteStatsStore,
};

pub struct AppState {
    pub router: Arc<ProviderRouter>,
    pub settings: Arc<RoutingSettings>,
    pub quota: Arc<QuotaTracker>,
    pub stats_store: Arc<dyn StatsStore>,
    pub janitor: Arc<CacheJanitor>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("TH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let config_source: Arc<dyn ConfigSource> =
        Arc::new(JsonFileConfigSource::new(&config.providers_file));
    let settings = if Path::new(&config.providers_file).exists() {
        RoutingSettings::load(config_source)?
    } else {
        tracing::warn!(
            "Providers file {} not found; starting with no providers configured",
            config.providers_file
        );
        RoutingSettings::with_config(config_source, RoutingConfig::default())
    };
    let settings = Arc::new(settings);

    let quota_store: Arc<dyn QuotaStore> =
        Arc::new(SqliteQuotaStore::new(pool.clone(), writer.clone()));
    let quota = Arc::new(QuotaTracker::new(quota_store, clock.clone()));

    let cache_store: Arc<dyn DurableStore> =
        Arc::new(SqliteCacheStore::new(pool.clone(), writer.clone()));
    let caches = Arc::new(RouterCaches::new(cache_store, &config.cache, clock.clone()));
    let janitor = Arc::new(CacheJanitor::new());
    caches.register_with(&janitor);

    let stats_store: Arc<dyn StatsStore> = Arc::new(SqliteStatsStore::new(pool.clone(), writer));
    // The worker lives as long as the router's sink; its handle is not needed.
    let (stats_sink, _stats_worker) = spawn_stats_worker(stats_store.clone(), clock);

    let adapters = ProviderAdapters::new()
        .with_all(Arc::new(FinnhubProvider::new()))
        .with_all(Arc::new(AlphaVantageProvider::new()));

    let router = ProviderRouter::new(
        settings.clone(),
        adapters,
        quota.clone(),
        caches,
        Arc::new(stats_sink),
    )
    .with_provider_timeout(config.provider_timeout);

    Ok(Arc::new(AppState {
        router: Arc::new(router),
        settings,
        quota,
        stats_store,
        janitor,
        db_path,
    }))
}
