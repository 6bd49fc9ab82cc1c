//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Both services share these types.

pub mod constants;
pub mod error;
pub mod job;
pub mod password;
pub mod session;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use job::{Application, ApplicationStatus, Contract, ContractStatus, Job, JobStatus};
pub use password::Password;
pub use session::{RefreshRecord, SessionRecord, SessionState};
pub use user::{normalize_email, User, UserResponse, UserRole, UserStatus};
