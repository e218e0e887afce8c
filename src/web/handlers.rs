//! HTTP request handlers.

use super::AppState;
use crate::status::{self, HourBar};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub latency_ms: i64,
}

/// Lightweight health endpoint with a storage round trip. This is also
/// the default target of the service's own http probe.
pub async fn handle_health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> impl IntoResponse {
    if let Some(expected) = &state.cfg.health_token {
        if query.token.as_deref() != Some(expected.as_str()) {
            return (StatusCode::FORBIDDEN, "invalid token").into_response();
        }
    }

    let start = Instant::now();
    let ok = match state.store.ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("health: storage ping failed: {}", e);
            false
        }
    };
    let latency_ms = start.elapsed().as_millis() as i64;

    let code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthResponse { ok, latency_ms })).into_response()
}

// ============================================================================
// Status API
// ============================================================================

/// Current up/down snapshot. Never fails: missing data reads as down.
pub async fn handle_status(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now().timestamp();
    let snapshot = status::current_status(
        &state.store,
        &state.cfg.monitored,
        state.cfg.interval_minutes,
        now,
    );
    Json(snapshot)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub bars: Vec<HourBar>,
    pub uptime_24h: f64,
}

/// Hour-by-hour history bars plus the trailing 24h mean.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let now = Utc::now().timestamp();

    let default_hours = state.cfg.status_page_days * 24;
    let max_hours = state.cfg.retention_days * 24;
    let hours = query.hours.unwrap_or(default_hours).clamp(1, max_hours);

    let bars = status::historical_bars(&state.store, hours, now);
    let uptime_24h = status::uptime_24h(&state.store, now);

    Json(HistoryResponse { bars, uptime_24h })
}
