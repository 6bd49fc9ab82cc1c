//! Service layer - business logic.

mod auth_service;
mod user_service;

pub use auth_service::{register_user, AuthService, Authenticator, SessionRef, TokenPair};
pub use user_service::{UserManager, UserService};
