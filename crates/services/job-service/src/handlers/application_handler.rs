//! Application handlers. Every route needs a bearer token.

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
use domain::{Application, ApplicationStatus};

use crate::service::ApplicationDraft;
use crate::state::AppState;

/// Apply to a job
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    #[validate(length(max = 5000, message = "Cover letter must be at most 5000 characters"))]
    pub cover_letter: Option<String>,
    #[validate(range(min = 0, message = "Proposed rate must not be negative"))]
    #[schema(example = 45)]
    pub proposed_rate: Option<i64>,
}

/// Revise a proposal. Omitted fields are cleared.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    #[validate(length(max = 5000, message = "Cover letter must be at most 5000 characters"))]
    pub cover_letter: Option<String>,
    #[validate(range(min = 0, message = "Proposed rate must not be negative"))]
    pub proposed_rate: Option<i64>,
}

/// Decision on an application
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateApplicationStatusRequest {
    pub status: ApplicationStatus,
}

/// Routes any authenticated user may call
pub fn application_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_applications))
        .route("/:id", get(get_application))
        .route("/:id/status", put(update_application_status))
}

/// Routes for applicants only
pub fn applicant_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_application))
        .route(
            "/:id",
            put(update_application).delete(withdraw_application),
        )
}

/// List applications visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/applications",
    tag = "Applications",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own applications, or those to own jobs"),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Application>>> {
    Ok(Json(
        state
            .application_service
            .list_applications(user, &params)
            .await?,
    ))
}

/// Get an application
#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application found", body = Application),
        (status = 403, description = "Neither applicant nor job owner"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn get_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Application>> {
    Ok(Json(
        state.application_service.get_application(user, id).await?,
    ))
}

/// Apply to a job
#[utoipa::path(
    post,
    path = "/api/v1/applications",
    tag = "Applications",
    request_body = CreateApplicationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 400, description = "Job closed or invalid input"),
        (status = 403, description = "Applicant role required"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied")
    )
)]
pub async fn create_application(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateApplicationRequest>,
) -> AppResult<(StatusCode, Json<Application>)> {
    let application = state
        .application_service
        .apply(
            user,
            ApplicationDraft {
                job_id: payload.job_id,
                cover_letter: payload.cover_letter,
                proposed_rate: payload.proposed_rate,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// Revise an own application
#[utoipa::path(
    put,
    path = "/api/v1/applications/{id}",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Application updated", body = Application),
        (status = 403, description = "Not the applicant"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn update_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateApplicationRequest>,
) -> AppResult<Json<Application>> {
    let application = state
        .application_service
        .update_application(user, id, payload.cover_letter, payload.proposed_rate)
        .await?;
    Ok(Json(application))
}

/// Accept or reject an application
#[utoipa::path(
    put,
    path = "/api/v1/applications/{id}/status",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = Application),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn update_application_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateApplicationStatusRequest>,
) -> AppResult<Json<Application>> {
    let application = state
        .application_service
        .set_status(user, id, payload.status)
        .await?;
    Ok(Json(application))
}

/// Withdraw an own application
#[utoipa::path(
    delete,
    path = "/api/v1/applications/{id}",
    tag = "Applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Application withdrawn"),
        (status = 403, description = "Not the applicant"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn withdraw_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.application_service.withdraw(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
