use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tickerhub_market_data::{NewsItem, QuoteInfo, TickerSummary};

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{SearchQuery, TickersQuery},
};

async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<TickerSummary>>> {
    Ok(Json(state.router.search(&query.q).await?))
}

async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickersQuery>,
) -> ApiResult<Json<HashMap<String, Vec<NewsItem>>>> {
    Ok(Json(state.router.news(&query.symbols()).await?))
}

async fn info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TickersQuery>,
) -> ApiResult<Json<HashMap<String, QuoteInfo>>> {
    Ok(Json(state.router.info(&query.symbols()).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/news", get(news))
        .route("/info", get(info))
}
