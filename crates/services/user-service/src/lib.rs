//! User Service Library
//!
//! Accounts, authentication and session lifecycle over HTTP. It can be run
//! as a standalone service or embedded in the combined binary.

pub mod config;
pub mod handlers;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod session;
pub mod state;

pub use common::MigrateAction;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use common::{
    CacheHealth, HealthCheck, RedisSessionCache, SessionCache, TokenCodec, TokenConfig, Verifier,
};
use domain::UserRole;

use crate::config::{database_url, UserServiceConfig, CLI_POOL_SIZE};
use crate::infra::Database;
use crate::repository::{UserRepository, UserStore};
use crate::routes::{create_router, RouterOptions};
use crate::service::{register_user, Authenticator, UserManager};
use crate::session::SessionStore;
use crate::state::AppState;

/// Run the user service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = UserServiceConfig::from_env()?;
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&database_url(), CLI_POOL_SIZE).await?;
    db.migrate(action).await?;
    Ok(())
}

/// Provision an administrator account. Admins cannot self-register.
pub async fn create_admin(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&database_url(), CLI_POOL_SIZE).await?;
    let users = UserStore::new(db.get_connection());

    let user = register_user(&users, email, password, UserRole::Admin).await?;
    info!(user_id = %user.id, email = %user.email, "Admin account created");
    Ok(())
}

/// Wire repositories, session store and services into handler state.
pub fn build_state(
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn SessionCache>,
    token: &TokenConfig,
    extra_checks: Vec<Arc<dyn HealthCheck>>,
) -> AppState {
    let codec = TokenCodec::from_config(token);
    let auth_service = Arc::new(Authenticator::new(
        users.clone(),
        SessionStore::new(cache.clone()),
        codec.clone(),
        token.clone(),
    ));
    let user_service = Arc::new(UserManager::new(users));
    let verifier: Verifier = Arc::new(codec);

    let mut checks: Vec<Arc<dyn HealthCheck>> = extra_checks;
    checks.push(Arc::new(CacheHealth(cache)));

    AppState::new(auth_service, user_service, verifier, checks)
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: UserServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database_url, config.database_max_connections).await?;
    let db_conn = db.get_connection();

    // Session cache
    let cache = RedisSessionCache::connect(&config.redis_url, config.cache_timeout()).await?;
    info!("Session cache connected");

    let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(db_conn));
    let checks: Vec<Arc<dyn HealthCheck>> = vec![Arc::new(db)];
    let state = build_state(users, Arc::new(cache), &config.token, checks);

    let app = create_router(
        state,
        &RouterOptions {
            request_timeout: config.request_timeout(),
            cors_origins: config.cors_origins.clone(),
        },
    );

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("User service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
