//! Common utilities shared across all microservices.
//!
//! This crate provides:
//! - Unified error handling for HTTP responses
//! - The validated JSON extractor
//! - Database pool and migration commands (`database`)
//! - Shared configuration helpers
//! - Dependency health reporting, CORS and pagination types
//! - The access token codec and authorization middleware (`jwt`)
//! - The session cache protocol and its Redis backend (`cache`)

pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod extract;
#[cfg(feature = "jwt")]
pub mod gate;
pub mod health;
pub mod http;
pub mod pagination;
pub mod session;
#[cfg(feature = "jwt")]
pub mod token;

pub use config::{env_any, env_or, env_parse, ConfigError, TokenConfig};
#[cfg(feature = "database")]
pub use database::{Database, MigrateAction};
pub use error::{AppError, AppResult, OptionExt};
pub use extract::ValidatedJson;
#[cfg(feature = "jwt")]
pub use gate::{auth_required, require_role, role_required, CurrentUser, RequiredRoles, Verifier};
pub use health::{CacheHealth, HealthCheck};
pub use http::{cors_layer, parse_origins};
pub use pagination::{Paginated, PaginationParams};
pub use session::SessionCache;
#[cfg(feature = "cache")]
pub use session::RedisSessionCache;
#[cfg(any(test, feature = "test-utils"))]
pub use session::MemorySessionCache;
#[cfg(feature = "jwt")]
pub use token::{AccessVerifier, Claims, Identity, TokenCodec, TokenError, TokenType};
