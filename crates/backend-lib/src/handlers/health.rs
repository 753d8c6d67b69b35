use std::sync::Arc;

use authgate_common::HealthResponse;
use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};

use crate::AppState;

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
