//! Service layer - business logic and authorization checks.

mod application_service;
mod contract_service;
mod job_service;
mod stats_service;

use uuid::Uuid;

use common::{AppError, AppResult, CurrentUser};

pub use application_service::{ApplicationDraft, ApplicationManager, ApplicationService};
pub use contract_service::{ContractDraft, ContractManager, ContractService};
pub use job_service::{JobDraft, JobManager, JobService};
pub use stats_service::{MarketplaceStats, StatsCollector, StatsService};

#[cfg(any(test, feature = "test-utils"))]
pub use application_service::MockApplicationService;
#[cfg(any(test, feature = "test-utils"))]
pub use contract_service::MockContractService;
#[cfg(any(test, feature = "test-utils"))]
pub use job_service::MockJobService;
#[cfg(any(test, feature = "test-utils"))]
pub use stats_service::MockStatsService;

/// Let the owning user or any admin through.
fn ensure_owner_or_admin(actor: &CurrentUser, owner: Uuid) -> AppResult<()> {
    if actor.is_admin() || actor.id == owner {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
