//! OpenAPI documentation configuration.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use domain::{UserResponse, UserRole, UserStatus};

use crate::handlers::{admin_handler, auth_handler, health_handler, user_handler};
use crate::service::TokenPair;

/// OpenAPI documentation for the user service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Service",
        version = "0.1.0",
        description = "Accounts, authentication and session management",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8001", description = "Local development server")
    ),
    paths(
        health_handler::health_check,
        auth_handler::register,
        auth_handler::login,
        auth_handler::refresh,
        auth_handler::logout,
        user_handler::get_profile,
        user_handler::update_profile,
        admin_handler::list_users,
        admin_handler::get_user,
        admin_handler::update_status,
    ),
    components(
        schemas(
            UserRole,
            UserStatus,
            UserResponse,
            TokenPair,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RefreshRequest,
            auth_handler::LogoutRequest,
            auth_handler::MessageResponse,
            user_handler::UpdateProfileRequest,
            admin_handler::UpdateStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Registration, login and session lifecycle"),
        (name = "Users", description = "Profile of the signed-in user"),
        (name = "Admin", description = "Account administration")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
