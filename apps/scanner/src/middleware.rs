// [apps/scanner/src/middleware.rs]
/*!
 * Gates the HTTP surface on maintenance mode. There is no auth surface in
 * this crate: the scheduler and observer run regardless of this guard, and
 * the health endpoint is meant to be reachable without credentials.
 */

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!(%reason, "request rejected, system in maintenance mode");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "MAINTENANCE_MODE_ACTIVE",
                "reason": reason,
                "retry_after": 60
            })),
        )
            .into_response();
    }
    next.run(req).await
}
