//! Application state for dependency injection.

use std::sync::Arc;

use common::{HealthCheck, Verifier};

use crate::service::{ApplicationService, ContractService, JobService, StatsService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub job_service: Arc<dyn JobService>,
    pub application_service: Arc<dyn ApplicationService>,
    pub contract_service: Arc<dyn ContractService>,
    pub stats_service: Arc<dyn StatsService>,
    /// Access token verifier; this service never issues tokens
    pub verifier: Verifier,
    /// Dependencies reported by `/health`
    pub health_checks: Arc<Vec<Arc<dyn HealthCheck>>>,
}
