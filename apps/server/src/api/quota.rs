use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tickerhub_market_data::Provider;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::ProviderQuota,
};

/// Usage and headroom for every configured provider.
async fn get_quota(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ProviderQuota>>> {
    let snapshot = state.settings.snapshot();
    let report = state.quota.usage_report(&snapshot).await?;
    Ok(Json(report.into_iter().map(ProviderQuota::from).collect()))
}

async fn reset_all(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.quota.reset_all_usage().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_provider(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> ApiResult<StatusCode> {
    let provider = Provider::from_str(&provider)
        .map_err(|_| ApiError::NotFound(format!("Unknown provider '{}'", provider)))?;
    state.quota.reset_usage(provider).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quota", get(get_quota))
        .route("/quota/reset", post(reset_all))
        .route("/quota/{provider}/reset", post(reset_provider))
}
