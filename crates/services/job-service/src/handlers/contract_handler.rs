//! Contract handlers. Every route needs a bearer token.

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
use domain::{Contract, ContractStatus};

use crate::service::ContractDraft;
use crate::state::AppState;

/// Create a contract from an application
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub application_id: Uuid,
    #[validate(range(min = 1, message = "Amount must be positive"))]
    #[schema(example = 1200)]
    pub amount: i64,
    pub terms: Option<String>,
}

/// Replace amount and terms
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateContractRequest {
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
    pub terms: Option<String>,
}

/// Contract status change
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateContractStatusRequest {
    pub status: ContractStatus,
}

/// Routes for either party
pub fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contracts))
        .route("/:id", get(get_contract).put(update_contract))
        .route("/:id/status", put(update_contract_status))
}

/// Contract creation. Mounted behind the employer/admin role gate.
pub fn contract_creation_routes() -> Router<AppState> {
    Router::new().route("/", post(create_contract))
}

/// List contracts the caller is party to
#[utoipa::path(
    get,
    path = "/api/v1/contracts",
    tag = "Contracts",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, at most 100")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of contracts"),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Contract>>> {
    Ok(Json(
        state.contract_service.list_contracts(user, &params).await?,
    ))
}

/// Get a contract
#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}",
    tag = "Contracts",
    params(("id" = Uuid, Path, description = "Contract ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contract found", body = Contract),
        (status = 403, description = "Not a party to the contract"),
        (status = 404, description = "Contract not found")
    )
)]
pub async fn get_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Contract>> {
    Ok(Json(state.contract_service.get_contract(user, id).await?))
}

/// Create a contract
#[utoipa::path(
    post,
    path = "/api/v1/contracts",
    tag = "Contracts",
    request_body = CreateContractRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Contract created", body = Contract),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already has a contract")
    )
)]
pub async fn create_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateContractRequest>,
) -> AppResult<(StatusCode, Json<Contract>)> {
    let contract = state
        .contract_service
        .create_contract(
            user,
            ContractDraft {
                application_id: payload.application_id,
                amount: payload.amount,
                terms: payload.terms,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(contract)))
}

/// Revise a contract
#[utoipa::path(
    put,
    path = "/api/v1/contracts/{id}",
    tag = "Contracts",
    params(("id" = Uuid, Path, description = "Contract ID")),
    request_body = UpdateContractRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contract updated", body = Contract),
        (status = 403, description = "Not the employer"),
        (status = 404, description = "Contract not found")
    )
)]
pub async fn update_contract(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateContractRequest>,
) -> AppResult<Json<Contract>> {
    let contract = state
        .contract_service
        .update_contract(user, id, payload.amount, payload.terms)
        .await?;
    Ok(Json(contract))
}

/// Complete or cancel a contract
#[utoipa::path(
    put,
    path = "/api/v1/contracts/{id}/status",
    tag = "Contracts",
    params(("id" = Uuid, Path, description = "Contract ID")),
    request_body = UpdateContractStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = Contract),
        (status = 403, description = "Not a party to the contract"),
        (status = 404, description = "Contract not found")
    )
)]
pub async fn update_contract_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateContractStatusRequest>,
) -> AppResult<Json<Contract>> {
    let contract = state
        .contract_service
        .set_status(user, id, payload.status)
        .await?;
    Ok(Json(contract))
}
