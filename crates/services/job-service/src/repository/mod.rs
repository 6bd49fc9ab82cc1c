//! Repository layer for data access.

pub mod entities;
mod application_repository;
mod contract_repository;
mod job_repository;

pub use application_repository::{
    ApplicationFilter, ApplicationRepository, ApplicationStore, NewApplication,
};
pub use contract_repository::{ContractFilter, ContractRepository, ContractStore, NewContract};
pub use job_repository::{JobChanges, JobFilter, JobRepository, JobStore, NewJob};

#[cfg(any(test, feature = "test-utils"))]
pub use application_repository::MockApplicationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use contract_repository::MockContractRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use job_repository::MockJobRepository;
