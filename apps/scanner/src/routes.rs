// [apps/scanner/src/routes.rs]
use crate::handlers::health::handle_health;
use crate::middleware::health_guard;
use crate::state::AppState;
use axum::{http::Method, middleware, routing::get, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handle_health))
        .layer(middleware::from_fn_with_state(state.clone(), health_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
