use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tickerhub_core::stats::ProviderStats;

use crate::{error::ApiResult, main_lib::AppState, models::ConfigSummary};

/// Reloads the routing config; in-flight requests keep their snapshot.
async fn refresh_config(State(state): State<Arc<AppState>>) -> ApiResult<Json<ConfigSummary>> {
    let snapshot = state.settings.refresh()?;
    let mut providers: Vec<_> = snapshot.providers.keys().copied().collect();
    providers.sort();
    Ok(Json(ConfigSummary { providers }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ProviderStats>>> {
    Ok(Json(state.stats_store.all_stats().await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/config/refresh", post(refresh_config))
        .route("/stats", get(get_stats))
}
