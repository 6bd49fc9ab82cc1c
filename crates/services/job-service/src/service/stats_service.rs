//! Marketplace-wide counters for administrators.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use common::AppResult;
use domain::{ApplicationStatus, ContractStatus};

use crate::repository::{
    ApplicationFilter, ApplicationRepository, ContractFilter, ContractRepository, JobFilter,
    JobRepository,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Marketplace totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceStats {
    pub total_jobs: u64,
    pub open_jobs: u64,
    pub total_applications: u64,
    pub pending_applications: u64,
    pub total_contracts: u64,
    pub active_contracts: u64,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StatsService: Send + Sync {
    async fn stats(&self) -> AppResult<MarketplaceStats>;
}

pub struct StatsCollector {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    contracts: Arc<dyn ContractRepository>,
}

impl StatsCollector {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        contracts: Arc<dyn ContractRepository>,
    ) -> Self {
        Self {
            jobs,
            applications,
            contracts,
        }
    }
}

#[async_trait]
impl StatsService for StatsCollector {
    async fn stats(&self) -> AppResult<MarketplaceStats> {
        let pending = ApplicationFilter {
            status: Some(ApplicationStatus::Pending),
            ..ApplicationFilter::default()
        };
        let active = ContractFilter {
            status: Some(ContractStatus::Active),
            ..ContractFilter::default()
        };

        let (
            total_jobs,
            open_jobs,
            total_applications,
            pending_applications,
            total_contracts,
            active_contracts,
        ) = tokio::try_join!(
            self.jobs.count(JobFilter::default()),
            self.jobs.count(JobFilter::open()),
            self.applications.count(ApplicationFilter::default()),
            self.applications.count(pending),
            self.contracts.count(ContractFilter::default()),
            self.contracts.count(active),
        )?;

        Ok(MarketplaceStats {
            total_jobs,
            open_jobs,
            total_applications,
            pending_applications,
            total_contracts,
            active_contracts,
        })
    }
}
