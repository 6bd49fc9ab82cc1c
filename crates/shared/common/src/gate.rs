//! Request authorization stages shared by both services.
//!
//! `auth_required` turns a bearer token into a [`CurrentUser`] without
//! touching any shared store. `role_required` runs after it and rejects
//! callers whose role is not in the route group's set.
//!
//! ```ignore
//! Router::new()
//!     .route("/", post(create_job))
//!     .route_layer(from_fn_with_state(RequiredRoles(&[UserRole::Employer]), role_required))
//!     .route_layer(from_fn_with_state(verifier, auth_required))
//! ```
//!
//! Layers wrap outside-in, so the last `route_layer` runs first.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use domain::{UserRole, BEARER_TOKEN_PREFIX};

use crate::error::{AppError, AppResult};
use crate::token::{AccessVerifier, Claims};

/// Shared verifier handle used as middleware state.
pub type Verifier = Arc<dyn AccessVerifier>;

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: UserRole,
    pub session_id: Uuid,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            session_id: claims.sid,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Roles admitted to a route group. Membership is exact: admin is not
/// implied unless listed.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [UserRole]);

/// Reject unless the request carries a valid access token.
pub async fn auth_required(
    State(verifier): State<Verifier>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)?;
    let claims = verifier.verify_access(token)?;

    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}

/// Reject unless the authenticated caller holds one of the required roles.
pub async fn role_required(
    State(roles): State<RequiredRoles>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or(AppError::Unauthorized)?;

    require_role(&user, roles.0)?;

    Ok(next.run(request).await)
}

/// Per-resource role check for use inside handlers.
pub fn require_role(user: &CurrentUser, roles: &[UserRole]) -> AppResult<()> {
    if user.role.is_one_of(roles) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, "Role not permitted");
        Err(AppError::Forbidden)
    }
}

/// Extract bearer token from Authorization header.
fn extract_token(request: &Request<Body>) -> AppResult<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use axum::{
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    use super::*;
    use crate::token::{Identity, TokenCodec, TokenType};

    const SECRET: &[u8] = b"gate-test-secret-that-is-long-enough!!";

    async fn whoami(user: CurrentUser) -> String {
        user.id.to_string()
    }

    fn router(roles: &'static [UserRole]) -> Router {
        let verifier: Verifier = Arc::new(TokenCodec::new(SECRET));
        Router::new()
            .route("/", get(whoami))
            .route_layer(from_fn_with_state(RequiredRoles(roles), role_required))
            .route_layer(from_fn_with_state(verifier, auth_required))
    }

    fn token_for(role: UserRole, token_type: TokenType, lifetime: Duration) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = TokenCodec::new(SECRET)
            .issue(
                Identity {
                    user_id,
                    role,
                    session_id: Uuid::new_v4(),
                },
                token_type,
                lifetime,
            )
            .unwrap();
        (user_id, token)
    }

    async fn call(router: Router, auth: Option<String>) -> Response {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let res = call(router(&[UserRole::Employer]), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let res = call(router(&[UserRole::Employer]), Some("Basic abc".into())).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_with_role_passes() {
        let (user_id, token) = token_for(UserRole::Employer, TokenType::Access, Duration::minutes(5));
        let res = call(router(&[UserRole::Employer]), Some(format!("Bearer {}", token))).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let (_, token) = token_for(UserRole::Applicant, TokenType::Access, Duration::minutes(5));
        let res = call(router(&[UserRole::Employer]), Some(format!("Bearer {}", token))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_not_implied() {
        let (_, token) = token_for(UserRole::Admin, TokenType::Access, Duration::minutes(5));
        let res = call(router(&[UserRole::Employer]), Some(format!("Bearer {}", token))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let (_, token) = token_for(UserRole::Employer, TokenType::Access, Duration::seconds(-30));
        let res = call(router(&[UserRole::Employer]), Some(format!("Bearer {}", token))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_typed_token_is_unauthorized() {
        let (_, token) = token_for(UserRole::Employer, TokenType::Refresh, Duration::days(1));
        let res = call(router(&[UserRole::Employer]), Some(format!("Bearer {}", token))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_required_without_auth_is_unauthorized() {
        let app = Router::new().route("/", get(|| async { "ok" })).route_layer(
            from_fn_with_state(RequiredRoles(&[UserRole::Admin]), role_required),
        );
        let res = call(app, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_role_helper() {
        let user = CurrentUser {
            id: Uuid::new_v4(),
            role: UserRole::Applicant,
            session_id: Uuid::new_v4(),
        };
        assert!(require_role(&user, &[UserRole::Applicant, UserRole::Employer]).is_ok());
        assert!(matches!(
            require_role(&user, &[UserRole::Admin]),
            Err(AppError::Forbidden)
        ));
    }
}
