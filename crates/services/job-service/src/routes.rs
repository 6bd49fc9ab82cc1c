//! Route configuration.

use std::time::Duration;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{auth_required, cors_layer, role_required, RequiredRoles};
use domain::UserRole;

use crate::handlers::{
    admin_routes, applicant_routes, application_routes, contract_creation_routes,
    contract_routes, health_routes, manage_job_routes, public_job_routes,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

const ADMIN_ONLY: RequiredRoles = RequiredRoles(&[UserRole::Admin]);
const APPLICANT_ONLY: RequiredRoles = RequiredRoles(&[UserRole::Applicant]);
const EMPLOYER_OR_ADMIN: RequiredRoles = RequiredRoles(&[UserRole::Employer, UserRole::Admin]);

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

    // Browsing is public; posting needs an employer or admin
    let jobs = public_job_routes().merge(
        manage_job_routes()
            .route_layer(from_fn_with_state(EMPLOYER_OR_ADMIN, role_required))
            .route_layer(authenticated.clone()),
    );

    let applications = application_routes()
        .merge(applicant_routes().route_layer(from_fn_with_state(APPLICANT_ONLY, role_required)))
        .route_layer(authenticated.clone());

    let contracts = contract_routes()
        .merge(
            contract_creation_routes()
                .route_layer(from_fn_with_state(EMPLOYER_OR_ADMIN, role_required)),
        )
        .route_layer(authenticated.clone());

    let admin = admin_routes()
        .route_layer(from_fn_with_state(ADMIN_ONLY, role_required))
        .route_layer(authenticated);

    Router::new()
        .merge(health_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1/jobs", jobs)
        .nest("/api/v1/applications", applications)
        .nest("/api/v1/contracts", contracts)
        .nest("/api/v1/admin", admin)
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
