//! Job posting handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::{AppResult, CurrentUser, Paginated, PaginationParams, ValidatedJson};
use domain::{Job, JobStatus};

use crate::repository::JobChanges;
use crate::service::JobDraft;
use crate::state::AppState;

/// New job posting
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    #[schema(example = "React developer for dashboard")]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    /// Budget in whole currency units
    #[validate(range(min = 0, message = "Budget must not be negative"))]
    #[schema(example = 1500)]
    pub budget: Option<i64>,
}

/// Partial job update
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Budget must not be negative"))]
    pub budget: Option<i64>,
    pub status: Option<JobStatus>,
}

/// Browsing routes, no token needed
pub fn public_job_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs))
        .route("/:id", get(get_job))
}

/// Posting and editing routes. Mounted behind auth and the poster role gate.
pub fn manage_job_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job))
        .route("/:id", put(update_job).delete(delete_job))
}

/// List jobs open for applications
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Jobs",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    responses((status = 200, description = "Page of open jobs"))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Job>>> {
    Ok(Json(state.job_service.list_open(&params).await?))
}

/// Get a job by ID
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found", body = Job),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Job>> {
    Ok(Json(state.job_service.get_job(id).await?))
}

/// Post a job
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    tag = "Jobs",
    request_body = CreateJobRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Job posted", body = Job),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Employer or admin role required")
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let job = state
        .job_service
        .create_job(
            user,
            JobDraft {
                title: payload.title,
                description: payload.description,
                budget: payload.budget,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// Edit a job
#[utoipa::path(
    put,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn update_job(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateJobRequest>,
) -> AppResult<Json<Job>> {
    let changes = JobChanges {
        title: payload.title,
        description: payload.description,
        budget: payload.budget,
        status: payload.status,
    };

    Ok(Json(state.job_service.update_job(user, id, changes).await?))
}

/// Delete a job
#[utoipa::path(
    delete,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "Job ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 400, description = "Job has contracts"),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn delete_job(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.job_service.delete_job(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
