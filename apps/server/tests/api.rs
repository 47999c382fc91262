use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
};
use tempfile::{tempdir, TempDir};
use tickerhub_core::cache::CacheSettings;
use tickerhub_server::{api::app_router, build_state, config::Config};
use tower::ServiceExt;

const PROVIDERS: &str = r#"{
  "providers": {
    "FINNHUB": {
      "baseUri": "http://127.0.0.1:9/api/v1",
      "apiKey": "file-key",
      "limit": { "perMinute": 60 }
    }
  },
  "priorities": {}
}"#;

async fn build_test_router() -> (axum::Router, TempDir) {
    let tmp = tempdir().unwrap();
    let providers_file = tmp.path().join("providers.json");
    std::fs::write(&providers_file, PROVIDERS).unwrap();

    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("db").join("test.db").to_string_lossy().to_string(),
        providers_file: providers_file.to_string_lossy().to_string(),
        provider_timeout: Some(Duration::from_secs(2)),
        cache: CacheSettings::default(),
        request_timeout: Duration::from_secs(5),
    };
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config), tmp)
}

async fn send(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn healthz_reports_configured_providers() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["configuredProviders"], 1);
}

#[tokio::test]
async fn blank_inputs_are_rejected() {
    let (app, _tmp) = build_test_router().await;
    let (status, _) = send(&app, Method::GET, "/api/v1/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/news?tickers=,,").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn no_ranked_provider_is_service_unavailable() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/info?tickers=AAPL").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 503);
}

#[tokio::test]
async fn quota_report_and_resets() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/quota").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["provider"], "FINNHUB");
    assert_eq!(body[0]["usedCount"], 0);
    assert_eq!(body[0]["remaining"], 60);
    assert_eq!(body[0]["available"], true);

    let (status, _) = send(&app, Method::POST, "/api/v1/quota/reset").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::POST, "/api/v1/quota/finnhub/reset").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::POST, "/api/v1/quota/NOPE/reset").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_start_empty_and_config_refreshes() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    let (status, body) = send(&app, Method::POST, "/api/v1/config/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providers"], serde_json::json!(["FINNHUB"]));
}
