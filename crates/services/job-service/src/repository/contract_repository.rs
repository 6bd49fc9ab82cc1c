//! Contract repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::contract::{self, ActiveModel, Entity as ContractEntity};
use common::{AppError, AppResult};
use domain::{Contract, ContractStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Fields needed to insert a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub employer_id: Uuid,
    pub applicant_id: Uuid,
    pub amount: i64,
    pub terms: Option<String>,
}

/// Listing filter. Empty matches every contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractFilter {
    /// Contracts where this user is employer or applicant
    pub party: Option<Uuid>,
    pub status: Option<ContractStatus>,
}

impl ContractFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(party) = self.party {
            condition = condition.add(
                Condition::any()
                    .add(contract::Column::EmployerId.eq(party))
                    .add(contract::Column::ApplicantId.eq(party)),
            );
        }
        if let Some(status) = self.status {
            condition = condition.add(contract::Column::Status.eq(status.as_str()));
        }
        condition
    }
}

/// Contract repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Find contract by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>>;

    /// Insert an active contract. A second contract for one application
    /// yields `Conflict`.
    async fn create(&self, new_contract: NewContract) -> AppResult<Contract>;

    /// Replace amount and terms
    async fn update_terms(&self, id: Uuid, amount: i64, terms: Option<String>)
        -> AppResult<Contract>;

    /// Change contract status
    async fn update_status(&self, id: Uuid, status: ContractStatus) -> AppResult<Contract>;

    /// List matching contracts, newest first
    async fn list(&self, filter: ContractFilter, offset: u64, limit: u64)
        -> AppResult<Vec<Contract>>;

    /// Count matching contracts
    async fn count(&self, filter: ContractFilter) -> AppResult<u64>;
}

/// Concrete implementation of ContractRepository
pub struct ContractStore {
    db: DatabaseConnection,
}

impl ContractStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<contract::Model> {
        ContractEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Contract"),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl ContractRepository for ContractStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>> {
        ContractEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Contract::try_from)
            .transpose()
    }

    async fn create(&self, new_contract: NewContract) -> AppResult<Contract> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(new_contract.job_id),
            application_id: Set(new_contract.application_id),
            employer_id: Set(new_contract.employer_id),
            applicant_id: Set(new_contract.applicant_id),
            amount: Set(new_contract.amount),
            terms: Set(new_contract.terms),
            status: Set(ContractStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_error)?;
        Contract::try_from(model)
    }

    async fn update_terms(
        &self,
        id: Uuid,
        amount: i64,
        terms: Option<String>,
    ) -> AppResult<Contract> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.amount = Set(amount);
        active.terms = Set(terms);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Contract::try_from(model)
    }

    async fn update_status(&self, id: Uuid, status: ContractStatus) -> AppResult<Contract> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Contract::try_from(model)
    }

    async fn list(
        &self,
        filter: ContractFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Contract>> {
        ContractEntity::find()
            .filter(filter.condition())
            .order_by_desc(contract::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Contract::try_from)
            .collect()
    }

    async fn count(&self, filter: ContractFilter) -> AppResult<u64> {
        Ok(ContractEntity::find()
            .filter(filter.condition())
            .count(&self.db)
            .await?)
    }
}
