//! Profile handlers for the signed-in user.

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use common::{AppResult, CurrentUser, ValidatedJson};
use domain::UserResponse;

use crate::state::AppState;

/// Profile update request. Omitting or blanking the name clears it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub display_name: Option<String>,
}

/// Create profile routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "Users",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_display_name(user.id, payload.display_name)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
