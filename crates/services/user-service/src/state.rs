//! Application state for dependency injection.

use std::sync::Arc;

use common::{HealthCheck, Verifier};

use crate::service::{AuthService, UserService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    /// Access token verifier used by the authorization middleware
    pub verifier: Verifier,
    /// Dependencies reported by `/health`
    pub health_checks: Arc<Vec<Arc<dyn HealthCheck>>>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        verifier: Verifier,
        health_checks: Vec<Arc<dyn HealthCheck>>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            verifier,
            health_checks: Arc::new(health_checks),
        }
    }
}
