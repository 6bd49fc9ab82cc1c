//! Route configuration.

use std::time::Duration;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{auth_required, cors_layer, role_required, RequiredRoles};
use domain::UserRole;

use crate::handlers::{admin_routes, auth_routes, health_routes, session_routes, user_routes};
use crate::openapi::ApiDoc;
use crate::state::AppState;

const ADMIN_ONLY: RequiredRoles = RequiredRoles(&[UserRole::Admin]);

/// HTTP-level settings for the router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Create the main router with all routes.
pub fn create_router(state: AppState, options: &RouterOptions) -> Router {
    let authenticated = from_fn_with_state(state.verifier.clone(), auth_required);

    Router::new()
        .merge(health_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Login, refresh and registration are public; logout needs a session
        .nest(
            "/api/v1/auth",
            auth_routes().merge(session_routes().route_layer(authenticated.clone())),
        )
        .nest("/api/v1/users", user_routes().route_layer(authenticated.clone()))
        // Role check runs after authentication
        .nest(
            "/api/v1/admin",
            admin_routes()
                .route_layer(from_fn_with_state(ADMIN_ONLY, role_required))
                .route_layer(authenticated),
        )
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
