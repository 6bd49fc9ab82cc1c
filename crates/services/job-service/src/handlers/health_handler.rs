//! Health check handler.

use axum::{extract::State, response::IntoResponse, routing::get, Router};

use crate::state::AppState;

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Report database connectivity.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database down")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    common::health::report("job-service", &state.health_checks).await
}
