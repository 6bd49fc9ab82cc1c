//! Application service - applying to jobs and deciding on applications.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{
    require_role, AppError, AppResult, CurrentUser, OptionExt, Paginated, PaginationParams,
};
use domain::{Application, ApplicationStatus, UserRole};

use super::ensure_owner_or_admin;
use crate::repository::{ApplicationFilter, ApplicationRepository, JobRepository, NewApplication};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Longest accepted cover letter, in characters
const MAX_COVER_LETTER_LENGTH: usize = 5000;

/// Proposal supplied by an applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
    pub proposed_rate: Option<i64>,
}

/// Application service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ApplicationService: Send + Sync {
    /// Applications the caller may see: their own as applicant, those to
    /// their jobs as employer, all of them as admin.
    async fn list_applications(
        &self,
        actor: CurrentUser,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Application>>;

    /// Every application
    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Application>>;

    /// Get an application visible to the caller
    async fn get_application(&self, actor: CurrentUser, id: Uuid) -> AppResult<Application>;

    /// Apply to an open job
    async fn apply(&self, actor: CurrentUser, draft: ApplicationDraft) -> AppResult<Application>;

    /// Revise an own application
    async fn update_application(
        &self,
        actor: CurrentUser,
        id: Uuid,
        cover_letter: Option<String>,
        proposed_rate: Option<i64>,
    ) -> AppResult<Application>;

    /// Accept or reject. Job owner or admin only.
    async fn set_status(
        &self,
        actor: CurrentUser,
        id: Uuid,
        status: ApplicationStatus,
    ) -> AppResult<Application>;

    /// Withdraw an own application
    async fn withdraw(&self, actor: CurrentUser, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of ApplicationService.
pub struct ApplicationManager {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
}

impl ApplicationManager {
    pub fn new(applications: Arc<dyn ApplicationRepository>, jobs: Arc<dyn JobRepository>) -> Self {
        Self { applications, jobs }
    }

    async fn find(&self, id: Uuid) -> AppResult<Application> {
        self.applications.find_by_id(id).await?.ok_or_not_found()
    }

    /// Employer of the job an application targets.
    async fn employer_of(&self, application: &Application) -> AppResult<Uuid> {
        let job = self
            .jobs
            .find_by_id(application.job_id)
            .await?
            .ok_or_else(|| AppError::internal("application references a missing job"))?;
        Ok(job.employer_id)
    }

    async fn own_application(&self, actor: &CurrentUser, id: Uuid) -> AppResult<Application> {
        let application = self.find(id).await?;
        if application.applicant_id != actor.id {
            return Err(AppError::Forbidden);
        }
        Ok(application)
    }

    async fn page(
        &self,
        filter: ApplicationFilter,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Application>> {
        let applications = self
            .applications
            .list(filter, params.offset(), params.limit())
            .await?;
        let total = self.applications.count(filter).await?;
        Ok(Paginated::new(applications, params, total))
    }
}

fn clean_proposal(
    cover_letter: Option<String>,
    proposed_rate: Option<i64>,
) -> AppResult<(Option<String>, Option<i64>)> {
    let cover_letter = cover_letter
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    if let Some(text) = &cover_letter {
        if text.chars().count() > MAX_COVER_LETTER_LENGTH {
            return Err(AppError::validation(format!(
                "Cover letter must be at most {} characters",
                MAX_COVER_LETTER_LENGTH
            )));
        }
    }
    if matches!(proposed_rate, Some(rate) if rate < 0) {
        return Err(AppError::validation("Proposed rate must not be negative"));
    }

    Ok((cover_letter, proposed_rate))
}

#[async_trait]
impl ApplicationService for ApplicationManager {
    async fn list_applications(
        &self,
        actor: CurrentUser,
        params: &PaginationParams,
    ) -> AppResult<Paginated<Application>> {
        let filter = match actor.role {
            UserRole::Applicant => ApplicationFilter {
                applicant_id: Some(actor.id),
                ..ApplicationFilter::default()
            },
            UserRole::Employer => ApplicationFilter {
                employer_id: Some(actor.id),
                ..ApplicationFilter::default()
            },
            UserRole::Admin => ApplicationFilter::default(),
        };
        self.page(filter, params).await
    }

    async fn list_all(&self, params: &PaginationParams) -> AppResult<Paginated<Application>> {
        self.page(ApplicationFilter::default(), params).await
    }

    async fn get_application(&self, actor: CurrentUser, id: Uuid) -> AppResult<Application> {
        let application = self.find(id).await?;
        if application.applicant_id == actor.id {
            return Ok(application);
        }

        ensure_owner_or_admin(&actor, self.employer_of(&application).await?)?;
        Ok(application)
    }

    async fn apply(&self, actor: CurrentUser, draft: ApplicationDraft) -> AppResult<Application> {
        require_role(&actor, &[UserRole::Applicant])?;
        let (cover_letter, proposed_rate) = clean_proposal(draft.cover_letter, draft.proposed_rate)?;

        let job = self.jobs.find_by_id(draft.job_id).await?.ok_or_not_found()?;
        if !job.status.accepts_applications() {
            return Err(AppError::validation("Job is not accepting applications"));
        }

        let application = self
            .applications
            .create(NewApplication {
                job_id: job.id,
                applicant_id: actor.id,
                cover_letter,
                proposed_rate,
            })
            .await?;

        tracing::info!(
            application_id = %application.id,
            job_id = %job.id,
            applicant_id = %actor.id,
            "Application submitted"
        );
        Ok(application)
    }

    async fn update_application(
        &self,
        actor: CurrentUser,
        id: Uuid,
        cover_letter: Option<String>,
        proposed_rate: Option<i64>,
    ) -> AppResult<Application> {
        self.own_application(&actor, id).await?;
        let (cover_letter, proposed_rate) = clean_proposal(cover_letter, proposed_rate)?;
        self.applications
            .update_proposal(id, cover_letter, proposed_rate)
            .await
    }

    async fn set_status(
        &self,
        actor: CurrentUser,
        id: Uuid,
        status: ApplicationStatus,
    ) -> AppResult<Application> {
        let application = self.find(id).await?;
        ensure_owner_or_admin(&actor, self.employer_of(&application).await?)?;

        let updated = self.applications.update_status(id, status).await?;
        tracing::info!(application_id = %id, actor = %actor.id, status = %status, "Application status changed");
        Ok(updated)
    }

    async fn withdraw(&self, actor: CurrentUser, id: Uuid) -> AppResult<()> {
        self.own_application(&actor, id).await?;
        self.applications.delete(id).await?;
        tracing::info!(application_id = %id, applicant_id = %actor.id, "Application withdrawn");
        Ok(())
    }
}
