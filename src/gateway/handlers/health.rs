//! Health check handler

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;

use super::super::error::{ApiError, ApiResult, ErrorBody, ok};
use super::super::state::AppState;
use super::super::types::HealthResponse;

/// Plain-text banner
///
/// GET /
pub async fn root() -> &'static str {
    "Bank API OK"
}

/// Health check endpoint
///
/// Pings the store on every call. Store errors are logged, not exposed.
///
/// - Healthy: 200 OK + {status: "ok", timestamp_ms}
/// - Unhealthy: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable", body = ErrorBody)
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    if let Err(e) = state.store.ping().await {
        tracing::error!("[HEALTH] Store ping failed: {}", e);
        return ApiError::service_unavailable("unavailable").into_err();
    }

    ok(HealthResponse {
        status: "ok".to_string(),
        timestamp_ms,
    })
}
