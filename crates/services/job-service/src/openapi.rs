//! OpenAPI documentation configuration.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use domain::{Application, ApplicationStatus, Contract, ContractStatus, Job, JobStatus};

use crate::handlers::{
    admin_handler, application_handler, contract_handler, health_handler, job_handler,
};
use crate::service::MarketplaceStats;

/// OpenAPI documentation for the job service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Job Service",
        version = "0.1.0",
        description = "Jobs, applications and contracts",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8002", description = "Local development server")
    ),
    paths(
        health_handler::health_check,
        job_handler::list_jobs,
        job_handler::get_job,
        job_handler::create_job,
        job_handler::update_job,
        job_handler::delete_job,
        application_handler::list_applications,
        application_handler::get_application,
        application_handler::create_application,
        application_handler::update_application,
        application_handler::update_application_status,
        application_handler::withdraw_application,
        contract_handler::list_contracts,
        contract_handler::get_contract,
        contract_handler::create_contract,
        contract_handler::update_contract,
        contract_handler::update_contract_status,
        admin_handler::list_all_jobs,
        admin_handler::list_all_applications,
        admin_handler::list_all_contracts,
        admin_handler::stats,
    ),
    components(
        schemas(
            Job,
            JobStatus,
            Application,
            ApplicationStatus,
            Contract,
            ContractStatus,
            MarketplaceStats,
            job_handler::CreateJobRequest,
            job_handler::UpdateJobRequest,
            application_handler::CreateApplicationRequest,
            application_handler::UpdateApplicationRequest,
            application_handler::UpdateApplicationStatusRequest,
            contract_handler::CreateContractRequest,
            contract_handler::UpdateContractRequest,
            contract_handler::UpdateContractStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Jobs", description = "Job postings"),
        (name = "Applications", description = "Applications to jobs"),
        (name = "Contracts", description = "Contracts between employers and applicants"),
        (name = "Admin", description = "Marketplace administration")
    )
)]
pub struct ApiDoc;

/// Bearer tokens are issued by the user service
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
