// [apps/scanner/src/handlers/health.rs]
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    uptime_seconds: i64,
    metrics: crate::state::HealthMetrics,
}

pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        metrics: state.health_metrics().await,
    })
}
