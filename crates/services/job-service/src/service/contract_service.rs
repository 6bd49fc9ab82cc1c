//! Contract service - agreements between an employer and an applicant.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, CurrentUser, OptionExt, Paginated, PaginationParams};
use domain::{Contract, ContractStatus};

use super::ensure_owner_or_admin;
use crate::repository::{
    ApplicationRepository, ContractFilter, ContractRepository, JobRepository, NewContract,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Terms proposed by the employer for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDraft {
    pub application_id: Uuid,
    pub amount: i64,
    pub terms: Option<String>,
}

/// Contract service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ContractService: Send + Sync {
    /// Contracts the caller is party to; all of them for admins
    async fn list_contracts(
        &self,
        actor: CurrentUser,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Contract>>;

    /// Every contract
    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Contract>>;

    /// Get a contract the caller is party to
    async fn get_contract(&self, actor: CurrentUser, id: Uuid) -> AppResult<Contract>;

    /// Create a contract from an application to one of the caller's jobs
    async fn create_contract(&self, actor: CurrentUser, draft: ContractDraft)
        -> AppResult<Contract>;

    /// Revise amount and terms. Employer on the contract or admin only.
    async fn update_contract(
        &self,
        actor: CurrentUser,
        id: Uuid,
        amount: i64,
        terms: Option<String>,
    ) -> AppResult<Contract>;

    /// Complete or cancel. Either party or admin.
    async fn set_status(
        &self,
        actor: CurrentUser,
        id: Uuid,
        status: ContractStatus,
    ) -> AppResult<Contract>;
}

/// Concrete implementation of ContractService.
pub struct ContractManager {
    contracts: Arc<dyn ContractRepository>,
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
}

impl ContractManager {
    pub fn new(
        contracts: Arc<dyn ContractRepository>,
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            contracts,
            applications,
            jobs,
        }
    }

    async fn visible(&self, actor: &CurrentUser, id: Uuid) -> AppResult<Contract> {
        let contract = self.contracts.find_by_id(id).await?.ok_or_not_found()?;
        if actor.is_admin() || contract.is_party(actor.id) {
            Ok(contract)
        } else {
            Err(AppError::Forbidden)
        }
    }

    async fn page(
        &self,
        filter: ContractFilter,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Contract>> {
        let contracts = self
            .contracts
            .list(filter, params.offset(), params.limit())
            .await?;
        let total = self.contracts.count(filter).await?;
        Ok(Paginated::new(contracts, params, total))
    }
}

fn clean_terms(amount: i64, terms: Option<String>) -> AppResult<Option<String>> {
    if amount <= 0 {
        return Err(AppError::validation("Amount must be positive"));
    }
    Ok(terms
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}

#[async_trait]
impl ContractService for ContractManager {
    async fn list_contracts(
        &self,
        actor: CurrentUser,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Contract>> {
        let filter = if actor.is_admin() {
            ContractFilter::default()
        } else {
            ContractFilter {
                party: Some(actor.id),
                ..ContractFilter::default()
            }
        };
        self.page(filter, params).await
    }

    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Contract>> {
        self.page(ContractFilter::default(), params).await
    }

    async fn get_contract(&self, actor: CurrentUser, id: Uuid) -> AppResult<Contract> {
        self.visible(&actor, id).await
    }

    async fn create_contract(
        &self,
        actor: CurrentUser,
        draft: ContractDraft,
    ) -> AppResult<Contract> {
        let terms = clean_terms(draft.amount, draft.terms)?;

        let application = self
            .applications
            .find_by_id(draft.application_id)
            .await?
            .ok_or_not_found()?;
        let job = self
            .jobs
            .find_by_id(application.job_id)
            .await?
            .ok_or_else(|| AppError::internal("application references a missing job"))?;
        ensure_owner_or_admin(&actor, job.employer_id)?;

        let contract = self
            .contracts
            .create(NewContract {
                job_id: job.id,
                application_id: application.id,
                employer_id: job.employer_id,
                applicant_id: application.applicant_id,
                amount: draft.amount,
                terms,
            })
            .await?;

        tracing::info!(
            contract_id = %contract.id,
            job_id = %job.id,
            actor = %actor.id,
            "Contract created"
        );
        Ok(contract)
    }

    async fn update_contract(
        &self,
        actor: CurrentUser,
        id: Uuid,
        amount: i64,
        terms: Option<String>,
    ) -> AppResult<Contract> {
        let contract = self.contracts.find_by_id(id).await?.ok_or_not_found()?;
        ensure_owner_or_admin(&actor, contract.employer_id)?;

        let terms = clean_terms(amount, terms)?;
        self.contracts.update_terms(id, amount, terms).await
    }

    async fn set_status(
        &self,
        actor: CurrentUser,
        id: Uuid,
        status: ContractStatus,
    ) -> AppResult<Contract> {
        self.visible(&actor, id).await?;

        let updated = self.contracts.update_status(id, status).await?;
        tracing::info!(contract_id = %id, actor = %actor.id, status = %status, "Contract status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{MockApplicationRepository, MockContractRepository, MockJobRepository};
    use domain::{Application, ApplicationStatus, Job, JobStatus, UserRole};

    fn actor(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            role,
            session_id: Uuid::new_v4(),
        }
    }

    fn contract(employer_id: Uuid, applicant_id: Uuid) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            employer_id,
            applicant_id,
            amount: 1200,
            terms: None,
            status: ContractStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fixtures(employer_id: Uuid) -> (MockApplicationRepository, MockJobRepository, Application) {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            employer_id,
            title: "Data migration".to_string(),
            description: "Move records to Postgres".to_string(),
            budget: Some(1500),
            status: JobStatus::InProgress,
            created_at: now,
            updated_at: now,
        };
        let application = Application {
            id: Uuid::new_v4(),
            job_id: job.id,
            applicant_id: Uuid::new_v4(),
            cover_letter: None,
            proposed_rate: None,
            status: ApplicationStatus::Accepted,
            created_at: now,
            updated_at: now,
        };

        let mut applications = MockApplicationRepository::new();
        let found = application.clone();
        applications
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        let mut jobs = MockJobRepository::new();
        jobs.expect_find_by_id()
            .returning(move |_| Ok(Some(job.clone())));

        (applications, jobs, application)
    }

    #[tokio::test]
    async fn test_job_owner_creates_contract_with_parties_from_application() {
        let employer = actor(UserRole::Employer);
        let (applications, jobs, application) = fixtures(employer.id);
        let applicant_id = application.applicant_id;

        let mut contracts = MockContractRepository::new();
        contracts
            .expect_create()
            .withf(move |new| {
                new.employer_id == employer.id
                    && new.applicant_id == applicant_id
                    && new.terms.as_deref() == Some("Net 30")
            })
            .returning(|new| Ok(contract(new.employer_id, new.applicant_id)));

        let service = ContractManager::new(Arc::new(contracts), Arc::new(applications), Arc::new(jobs));
        let created = service
            .create_contract(
                employer,
                ContractDraft {
                    application_id: application.id,
                    amount: 1200,
                    terms: Some(" Net 30 ".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(created.is_party(applicant_id));
    }

    #[tokio::test]
    async fn test_other_employer_cannot_create_contract() {
        let (applications, jobs, application) = fixtures(Uuid::new_v4());
        let mut contracts = MockContractRepository::new();
        contracts.expect_create().never();

        let service = ContractManager::new(Arc::new(contracts), Arc::new(applications), Arc::new(jobs));
        let result = service
            .create_contract(
                actor(UserRole::Employer),
                ContractDraft {
                    application_id: application.id,
                    amount: 1200,
                    terms: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let service = ContractManager::new(
            Arc::new(MockContractRepository::new()),
            Arc::new(MockApplicationRepository::new()),
            Arc::new(MockJobRepository::new()),
        );
        let result = service
            .create_contract(
                actor(UserRole::Employer),
                ContractDraft {
                    application_id: Uuid::new_v4(),
                    amount: 0,
                    terms: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_either_party_may_change_status_but_not_outsiders() {
        let applicant = actor(UserRole::Applicant);
        let existing = contract(Uuid::new_v4(), applicant.id);
        let contract_id = existing.id;

        let mut contracts = MockContractRepository::new();
        contracts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        contracts
            .expect_update_status()
            .with(eq(contract_id), eq(ContractStatus::Completed))
            .times(1)
            .returning(move |_, status| {
                let mut done = contract(Uuid::new_v4(), Uuid::new_v4());
                done.status = status;
                Ok(done)
            });

        let service = ContractManager::new(
            Arc::new(contracts),
            Arc::new(MockApplicationRepository::new()),
            Arc::new(MockJobRepository::new()),
        );

        let outsider = service
            .set_status(actor(UserRole::Applicant), contract_id, ContractStatus::Completed)
            .await;
        assert!(matches!(outsider, Err(AppError::Forbidden)));

        let done = service
            .set_status(applicant, contract_id, ContractStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, ContractStatus::Completed);
    }

    #[tokio::test]
    async fn test_applicant_cannot_rewrite_terms() {
        let applicant = actor(UserRole::Applicant);
        let existing = contract(Uuid::new_v4(), applicant.id);
        let mut contracts = MockContractRepository::new();
        contracts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        contracts.expect_update_terms().never();

        let service = ContractManager::new(
            Arc::new(contracts),
            Arc::new(MockApplicationRepository::new()),
            Arc::new(MockJobRepository::new()),
        );
        let result = service
            .update_contract(applicant, Uuid::new_v4(), 2000, None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_non_admin_listing_is_scoped_to_party() {
        let employer = actor(UserRole::Employer);
        let expected = ContractFilter {
            party: Some(employer.id),
            status: None,
        };

        let mut contracts = MockContractRepository::new();
        contracts
            .expect_list()
            .with(eq(expected), eq(0), eq(20))
            .returning(|_, _, _| Ok(vec![]));
        contracts
            .expect_count()
            .with(eq(expected))
            .returning(|_| Ok(0));

        let service = ContractManager::new(
            Arc::new(contracts),
            Arc::new(MockApplicationRepository::new()),
            Arc::new(MockJobRepository::new()),
        );
        service
            .list_contracts(employer, &PaginationParams::default())
            .await
            .unwrap();
    }
}
