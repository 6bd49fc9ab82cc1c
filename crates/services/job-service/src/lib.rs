//! Job Service Library
//!
//! Job postings, applications and contracts over HTTP. Callers are
//! authenticated by verifying access tokens issued by the user service;
//! this service holds no session state.

pub mod config;
pub mod handlers;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use common::MigrateAction;

use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use common::{HealthCheck, TokenCodec, Verifier};

use crate::config::{database_url, JobServiceConfig, CLI_POOL_SIZE};
use crate::infra::Database;
use crate::repository::{
    ApplicationRepository, ApplicationStore, ContractRepository, ContractStore, JobRepository,
    JobStore,
};
use crate::routes::{create_router, RouterOptions};
use crate::service::{ApplicationManager, ContractManager, JobManager, StatsCollector};
use crate::state::AppState;

/// Run the job service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = JobServiceConfig::from_env()?;
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&database_url(), CLI_POOL_SIZE).await?;
    db.migrate(action).await?;
    Ok(())
}

/// Wire repositories and services into handler state.
pub fn build_state(
    db: DatabaseConnection,
    verifier: Verifier,
    health_checks: Vec<Arc<dyn HealthCheck>>,
) -> AppState {
    let jobs: Arc<dyn JobRepository> = Arc::new(JobStore::new(db.clone()));
    let applications: Arc<dyn ApplicationRepository> = Arc::new(ApplicationStore::new(db.clone()));
    let contracts: Arc<dyn ContractRepository> = Arc::new(ContractStore::new(db));

    AppState {
        job_service: Arc::new(JobManager::new(jobs.clone())),
        application_service: Arc::new(ApplicationManager::new(
            applications.clone(),
            jobs.clone(),
        )),
        contract_service: Arc::new(ContractManager::new(
            contracts.clone(),
            applications.clone(),
            jobs.clone(),
        )),
        stats_service: Arc::new(StatsCollector::new(jobs, applications, contracts)),
        verifier,
        health_checks: Arc::new(health_checks),
    }
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: JobServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database_url, config.database_max_connections).await?;
    let db_conn = db.get_connection();

    let verifier: Verifier = Arc::new(TokenCodec::from_config(&config.token));
    let checks: Vec<Arc<dyn HealthCheck>> = vec![Arc::new(db)];
    let state = build_state(db_conn, verifier, checks);

    let app = create_router(
        state,
        &RouterOptions {
            request_timeout: config.request_timeout(),
            cors_origins: config.cors_origins.clone(),
        },
    );

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Job service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
