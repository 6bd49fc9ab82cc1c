//! Marketplace records: job postings, applications and contracts.
//!
//! Status values are stored as lowercase strings. Transition rules between
//! statuses are not enforced here; callers only check who may change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Lifecycle of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Closed,
}

impl JobStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(JobStatus::Open),
            "in_progress" => Some(JobStatus::InProgress),
            "closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Closed => "closed",
        }
    }

    /// Whether applicants may still apply
    pub fn accepts_applications(&self) -> bool {
        matches!(self, JobStatus::Open)
    }
}

/// Decision on an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// State of an engagement between employer and applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
}

impl ContractStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ContractStatus::Active),
            "completed" => Some(ContractStatus::Completed),
            "cancelled" => Some(ContractStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
        }
    }
}

macro_rules! status_conversions {
    ($($status:ident => $label:literal),* $(,)?) => {
        $(
            impl TryFrom<&str> for $status {
                type Error = DomainError;

                fn try_from(s: &str) -> Result<Self, Self::Error> {
                    $status::parse(s).ok_or_else(|| {
                        DomainError::validation(format!("Unknown {} '{}'", $label, s))
                    })
                }
            }

            impl std::fmt::Display for $status {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

status_conversions!(
    JobStatus => "job status",
    ApplicationStatus => "application status",
    ContractStatus => "contract status",
);

/// Job posting owned by an employer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    /// Budget in whole currency units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.employer_id == user_id
    }
}

/// An applicant's bid on a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_rate: Option<i64>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Agreement created from an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub employer_id: Uuid,
    pub applicant_id: Uuid,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Employer or applicant on this contract
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.employer_id == user_id || self.applicant_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_round_trip() {
        for status in [JobStatus::Open, JobStatus::InProgress, JobStatus::Closed] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert!(ApplicationStatus::try_from("maybe").is_err());
        assert_eq!(ContractStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_only_open_jobs_accept_applications() {
        assert!(JobStatus::Open.accepts_applications());
        assert!(!JobStatus::InProgress.accepts_applications());
        assert!(!JobStatus::Closed.accepts_applications());
    }

    #[test]
    fn test_contract_parties() {
        let now = Utc::now();
        let contract = Contract {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            amount: 500,
            terms: None,
            status: ContractStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(contract.is_party(contract.employer_id));
        assert!(contract.is_party(contract.applicant_id));
        assert!(!contract.is_party(Uuid::new_v4()));
    }
}
