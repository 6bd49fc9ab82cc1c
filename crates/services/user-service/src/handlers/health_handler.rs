//! Health check handler.

use axum::{extract::State, response::IntoResponse, routing::get, Router};

use crate::state::AppState;

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Report database and session cache connectivity.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable"),
        (status = 503, description = "A dependency is down")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    common::health::report("user-service", &state.health_checks).await
}
