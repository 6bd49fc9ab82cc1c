//! HTTP request handlers.

pub mod admin_handler;
pub mod application_handler;
pub mod contract_handler;
pub mod health_handler;
pub mod job_handler;

pub use admin_handler::admin_routes;
pub use application_handler::{applicant_routes, application_routes};
pub use contract_handler::{contract_creation_routes, contract_routes};
pub use health_handler::health_routes;
pub use job_handler::{manage_job_routes, public_job_routes};
