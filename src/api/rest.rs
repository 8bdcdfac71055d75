// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// `GET /api/signal` serves the dashboard snapshot for one asset; `/api/v1/health`
// reports liveness and the state version. `GET /` returns the embedded page.
//
// CORS is configured permissively; the dashboard may be served from elsewhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::app_state::{AppState, SignalSnapshot, UnknownAsset};

const DASHBOARD_HTML: &str = include_str!("../../static/index.html");

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with tracing, CORS and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/api/signal", get(signal))
        .route("/api/v1/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// Request-level failures, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    UnknownAsset(UnknownAsset),
}

impl From<UnknownAsset> for ApiError {
    fn from(e: UnknownAsset) -> Self {
        Self::UnknownAsset(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::UnknownAsset(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// =============================================================================
// Dashboard
// =============================================================================

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// =============================================================================
// Signal snapshot
// =============================================================================

#[derive(Debug, Deserialize)]
struct SignalQuery {
    #[serde(default)]
    asset: Option<String>,
}

async fn signal(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignalQuery>,
) -> Result<Json<SignalSnapshot>, ApiError> {
    let asset = query.asset.as_deref().filter(|a| !a.is_empty());
    let snapshot = state.query_asset(asset).await.map_err(|e| {
        warn!(error = %e, "rejected signal query");
        e
    })?;
    Ok(Json(snapshot))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    Json(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::runtime_config::RuntimeConfig;
    use crate::test_fixtures::{rising_bars, StaticPrices};

    fn app() -> Router {
        let prices = StaticPrices::new(&[("EURUSD=X", rising_bars())]);
        router(Arc::new(AppState::new(RuntimeConfig::default(), prices)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn signal_endpoint_returns_snapshot() {
        let (status, body) = get_json(app(), "/api/signal?asset=EUR/USD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"], "EUR/USD");
        assert_eq!(body["signal"], "BUY");
        assert!(body["countdown"].is_u64());
        assert_eq!(body["assets"].as_array().unwrap().len(), 5);
        assert_eq!(body["all_signals"]["GBP/USD"], serde_json::json!([]));
        assert_eq!(body["chart"]["labels"].as_array().unwrap().len(), 44);
        // RSI warm-up points serialise as null.
        assert!(body["chart"]["rsi"][0].is_null());
    }

    #[tokio::test]
    async fn missing_asset_uses_default() {
        let (status, body) = get_json(app(), "/api/signal").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"], "EUR/USD");
    }

    #[tokio::test]
    async fn failed_fetch_still_answers_with_null_chart() {
        let (status, body) = get_json(app(), "/api/signal?asset=AUD/USD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signal"], "NONE");
        assert!(body["chart"].is_null());
        assert!(body["countdown"].is_null());
    }

    #[tokio::test]
    async fn unknown_asset_is_bad_request() {
        let (status, body) = get_json(app(), "/api/signal?asset=XAU/USD").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown asset: XAU/USD");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(app(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["state_version"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn root_serves_dashboard() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains("/api/signal"));
    }
}
