//! Application repository implementation.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::application::{self, ActiveModel, Entity as ApplicationEntity};
use super::entities::job;
use common::{AppError, AppResult};
use domain::{Application, ApplicationStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Fields needed to insert an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cover_letter: Option<String>,
    pub proposed_rate: Option<i64>,
}

/// Listing filter. Empty matches every application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub applicant_id: Option<Uuid>,
    /// Applications to jobs posted by this employer
    pub employer_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(applicant_id) = self.applicant_id {
            condition = condition.add(application::Column::ApplicantId.eq(applicant_id));
        }
        if let Some(employer_id) = self.employer_id {
            let owned_jobs = Query::select()
                .column(job::Column::Id)
                .from(job::Entity)
                .and_where(job::Column::EmployerId.eq(employer_id))
                .to_owned();
            condition = condition.add(application::Column::JobId.in_subquery(owned_jobs));
        }
        if let Some(status) = self.status {
            condition = condition.add(application::Column::Status.eq(status.as_str()));
        }
        condition
    }
}

/// Application repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Find application by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Application>>;

    /// Insert a pending application. Applying twice yields `Conflict`.
    async fn create(&self, new_application: NewApplication) -> AppResult<Application>;

    /// Replace cover letter and proposed rate
    async fn update_proposal(
        &self,
        id: Uuid,
        cover_letter: Option<String>,
        proposed_rate: Option<i64>,
    ) -> AppResult<Application>;

    /// Record a decision
    async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> AppResult<Application>;

    /// Delete an application. Fails once a contract references it.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// List matching applications, newest first
    async fn list(
        &self,
        filter: ApplicationFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Application>>;

    /// Count matching applications
    async fn count(&self, filter: ApplicationFilter) -> AppResult<u64>;
}

/// Concrete implementation of ApplicationRepository
pub struct ApplicationStore {
    db: DatabaseConnection,
}

impl ApplicationStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<application::Model> {
        ApplicationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Application"),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::bad_request("Application is referenced by a contract")
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl ApplicationRepository for ApplicationStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Application>> {
        ApplicationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn create(&self, new_application: NewApplication) -> AppResult<Application> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(new_application.job_id),
            applicant_id: Set(new_application.applicant_id),
            cover_letter: Set(new_application.cover_letter),
            proposed_rate: Set(new_application.proposed_rate),
            status: Set(ApplicationStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_error)?;
        Application::try_from(model)
    }

    async fn update_proposal(
        &self,
        id: Uuid,
        cover_letter: Option<String>,
        proposed_rate: Option<i64>,
    ) -> AppResult<Application> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.cover_letter = Set(cover_letter);
        active.proposed_rate = Set(proposed_rate);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Application::try_from(model)
    }

    async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> AppResult<Application> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Application::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ApplicationEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Application>> {
        ApplicationEntity::find()
            .filter(filter.condition())
            .order_by_desc(application::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Application::try_from)
            .collect()
    }

    async fn count(&self, filter: ApplicationFilter) -> AppResult<u64> {
        Ok(ApplicationEntity::find()
            .filter(filter.condition())
            .count(&self.db)
            .await?)
    }
}
