//! Job service - posting and managing jobs.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, CurrentUser, OptionExt, Paginated, PaginationParams};
use domain::Job;

use super::ensure_owner_or_admin;
use crate::repository::{JobChanges, JobFilter, JobRepository, NewJob};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Job content supplied by the poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub budget: Option<i64>,
}

/// Job service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait JobService: Send + Sync {
    /// Public listing of jobs still accepting applications
    async fn list_open(&self, params: &PaginationParams) -> AppResult<Paginated<Job>>;

    /// Every job regardless of status
    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Job>>;

    /// Get job by ID
    async fn get_job(&self, id: Uuid) -> AppResult<Job>;

    /// Post a job owned by the caller
    async fn create_job(&self, actor: CurrentUser, draft: JobDraft) -> AppResult<Job>;

    /// Edit a job. Owner or admin only.
    async fn update_job(&self, actor: CurrentUser, id: Uuid, changes: JobChanges) -> AppResult<Job>;

    /// Remove a job. Owner or admin only.
    async fn delete_job(&self, actor: CurrentUser, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of JobService using repository.
pub struct JobManager {
    jobs: Arc<dyn JobRepository>,
}

impl JobManager {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    async fn owned_job(&self, actor: &CurrentUser, id: Uuid) -> AppResult<Job> {
        let job = self.jobs.find_by_id(id).await?.ok_or_not_found()?;
        ensure_owner_or_admin(actor, job.employer_id)?;
        Ok(job)
    }

    async fn page(&self, filter: JobFilter, params: &PaginationParams) -> AppResult<Paginated<Job>> {
        let jobs = self
            .jobs
            .list(filter, params.offset(), params.limit())
            .await?;
        let total = self.jobs.count(filter).await?;
        Ok(Paginated::new(jobs, params, total))
    }
}

fn required_text(field: &str, value: String) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} must not be blank", field)));
    }
    Ok(value)
}

fn check_budget(budget: Option<i64>) -> AppResult<()> {
    match budget {
        Some(amount) if amount < 0 => Err(AppError::validation("Budget must not be negative")),
        _ => Ok(()),
    }
}

#[async_trait]
impl JobService for JobManager {
    async fn list_open(&self, params: &PaginationParams) -> AppResult<Paginated<Job>> {
        self.page(JobFilter::open(), params).await
    }

    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Job>> {
        self.page(JobFilter::default(), params).await
    }

    async fn get_job(&self, id: Uuid) -> AppResult<Job> {
        self.jobs.find_by_id(id).await?.ok_or_not_found()
    }

    async fn create_job(&self, actor: CurrentUser, draft: JobDraft) -> AppResult<Job> {
        check_budget(draft.budget)?;
        let new_job = NewJob {
            employer_id: actor.id,
            title: required_text("Title", draft.title)?,
            description: required_text("Description", draft.description)?,
            budget: draft.budget,
        };

        let job = self.jobs.create(new_job).await?;
        tracing::info!(job_id = %job.id, employer_id = %actor.id, "Job posted");
        Ok(job)
    }

    async fn update_job(
        &self,
        actor: CurrentUser,
        id: Uuid,
        changes: JobChanges,
    ) -> AppResult<Job> {
        self.owned_job(&actor, id).await?;
        check_budget(changes.budget)?;

        let changes = JobChanges {
            title: changes
                .title
                .map(|t| required_text("Title", t))
                .transpose()?,
            description: changes
                .description
                .map(|d| required_text("Description", d))
                .transpose()?,
            ..changes
        };

        self.jobs.update(id, changes).await
    }

    async fn delete_job(&self, actor: CurrentUser, id: Uuid) -> AppResult<()> {
        self.owned_job(&actor, id).await?;
        self.jobs.delete(id).await?;
        tracing::info!(job_id = %id, actor = %actor.id, "Job deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::MockJobRepository;
    use domain::{JobStatus, UserRole};

    fn actor(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            role,
            session_id: Uuid::new_v4(),
        }
    }

    fn job_owned_by(employer_id: Uuid) -> Job {
        Job {
            id: Uuid::new_v4(),
            employer_id,
            title: "Build a landing page".to_string(),
            description: "Static site, two pages".to_string(),
            budget: Some(800),
            status: JobStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_job_is_owned_by_caller() {
        let employer = actor(UserRole::Employer);
        let mut repo = MockJobRepository::new();
        repo.expect_create()
            .withf(move |new_job| {
                new_job.employer_id == employer.id && new_job.title == "Logo design"
            })
            .returning(|new_job| Ok(job_owned_by(new_job.employer_id)));

        let service = JobManager::new(Arc::new(repo));
        let job = service
            .create_job(
                employer,
                JobDraft {
                    title: "  Logo design ".to_string(),
                    description: "Vector logo".to_string(),
                    budget: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(job.employer_id, employer.id);
    }

    #[tokio::test]
    async fn test_create_job_rejects_negative_budget() {
        let service = JobManager::new(Arc::new(MockJobRepository::new()));
        let result = service
            .create_job(
                actor(UserRole::Employer),
                JobDraft {
                    title: "Logo".to_string(),
                    description: "Vector logo".to_string(),
                    budget: Some(-1),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_other_employer_cannot_update() {
        let owner = Uuid::new_v4();
        let job = job_owned_by(owner);
        let mut repo = MockJobRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(job.clone())));
        repo.expect_update().never();

        let service = JobManager::new(Arc::new(repo));
        let result = service
            .update_job(actor(UserRole::Employer), Uuid::new_v4(), JobChanges::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_may_delete_any_job() {
        let job = job_owned_by(Uuid::new_v4());
        let job_id = job.id;
        let mut repo = MockJobRepository::new();
        repo.expect_find_by_id()
            .with(eq(job_id))
            .returning(move |_| Ok(Some(job.clone())));
        repo.expect_delete().with(eq(job_id)).returning(|_| Ok(()));

        let service = JobManager::new(Arc::new(repo));
        tokio_test::assert_ok!(service.delete_job(actor(UserRole::Admin), job_id).await);
    }

    #[tokio::test]
    async fn test_missing_job_is_not_found() {
        let mut repo = MockJobRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = JobManager::new(Arc::new(repo));
        let result = service.get_job(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_public_listing_only_shows_open_jobs() {
        let mut repo = MockJobRepository::new();
        repo.expect_list()
            .with(eq(JobFilter::open()), eq(20), eq(20))
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count()
            .with(eq(JobFilter::open()))
            .returning(|_| Ok(25));

        let service = JobManager::new(Arc::new(repo));
        let params = PaginationParams {
            page: 2,
            per_page: 20,
        };
        let page = service.list_open(&params).await.unwrap();
        assert_eq!(page.meta.total, 25);
        assert_eq!(page.meta.total_pages, 2);
    }
}
