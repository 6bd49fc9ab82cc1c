//! Job repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::job::{self, ActiveModel, Entity as JobEntity};
use common::{AppError, AppResult};
use domain::{Job, JobStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Fields needed to insert a job posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: Option<i64>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<i64>,
    pub status: Option<JobStatus>,
}

/// Listing filter. Empty matches every job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub employer_id: Option<Uuid>,
}

impl JobFilter {
    pub fn open() -> Self {
        Self {
            status: Some(JobStatus::Open),
            ..Self::default()
        }
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(status) = self.status {
            condition = condition.add(job::Column::Status.eq(status.as_str()));
        }
        if let Some(employer_id) = self.employer_id {
            condition = condition.add(job::Column::EmployerId.eq(employer_id));
        }
        condition
    }
}

/// Job repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Find job by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Insert a new open job
    async fn create(&self, new_job: NewJob) -> AppResult<Job>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, changes: JobChanges) -> AppResult<Job>;

    /// Delete a job and its applications. Fails while contracts reference it.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// List matching jobs, newest first
    async fn list(&self, filter: JobFilter, offset: u64, limit: u64) -> AppResult<Vec<Job>>;

    /// Count matching jobs
    async fn count(&self, filter: JobFilter) -> AppResult<u64>;
}

/// Concrete implementation of JobRepository
pub struct JobStore {
    db: DatabaseConnection,
}

impl JobStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_delete_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::bad_request("Job has contracts and cannot be deleted")
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl JobRepository for JobStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        JobEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn create(&self, new_job: NewJob) -> AppResult<Job> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            employer_id: Set(new_job.employer_id),
            title: Set(new_job.title),
            description: Set(new_job.description),
            budget: Set(new_job.budget),
            status: Set(JobStatus::Open.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Job::try_from(model)
    }

    async fn update(&self, id: Uuid, changes: JobChanges) -> AppResult<Job> {
        let model = JobEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut active: ActiveModel = model.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(budget) = changes.budget {
            active.budget = Set(Some(budget));
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Job::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = JobEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_delete_error)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: JobFilter, offset: u64, limit: u64) -> AppResult<Vec<Job>> {
        JobEntity::find()
            .filter(filter.condition())
            .order_by_desc(job::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Job::try_from)
            .collect()
    }

    async fn count(&self, filter: JobFilter) -> AppResult<u64> {
        Ok(JobEntity::find()
            .filter(filter.condition())
            .count(&self.db)
            .await?)
    }
}
