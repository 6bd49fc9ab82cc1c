//! Account administration handlers. Mounted behind the admin role gate.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::{AppResult, CurrentUser, Paginated, PaginationParams, ValidatedJson};
use domain::{UserResponse, UserStatus};

use crate::state::AppState;

/// Status change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    /// `active` or `suspended`
    pub status: UserStatus,
}

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/status", put(update_status))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of users"),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state.user_service.list_users(&params).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Get any user by ID
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Activate or suspend an account
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 400, description = "Cannot change own status"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .set_status(admin.id, id, payload.status)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
