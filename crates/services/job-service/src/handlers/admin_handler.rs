//! Marketplace administration handlers. Mounted behind the admin role gate.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};

use common::{AppResult, Paginated, PaginationParams};
use domain::{Application, Contract, Job};

use crate::service::MarketplaceStats;
use crate::state::AppState;

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_all_jobs))
        .route("/applications", get(list_all_applications))
        .route("/contracts", get(list_all_contracts))
        .route("/stats", get(stats))
}

/// List every job regardless of status
#[utoipa::path(
    get,
    path = "/api/v1/admin/jobs",
    tag = "Admin",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of jobs"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_all_jobs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Job>>> {
    Ok(Json(state.job_service.list_all(&params).await?))
}

/// List every application
#[utoipa::path(
    get,
    path = "/api/v1/admin/applications",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of applications"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_all_applications(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Application>>> {
    Ok(Json(state.application_service.list_all(&params).await?))
}

/// List every contract
#[utoipa::path(
    get,
    path = "/api/v1/admin/contracts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of contracts"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_all_contracts(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Contract>>> {
    Ok(Json(state.contract_service.list_all(&params).await?))
}

/// Marketplace totals
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counts by status", body = MarketplaceStats),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<MarketplaceStats>> {
    Ok(Json(state.stats_service.stats().await?))
}
