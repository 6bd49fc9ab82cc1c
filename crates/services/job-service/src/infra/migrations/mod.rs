//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240201_000001_create_jobs_table;
mod m20240201_000002_create_applications_table;
mod m20240201_000003_create_contracts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240201_000001_create_jobs_table::Migration),
            Box::new(m20240201_000002_create_applications_table::Migration),
            Box::new(m20240201_000003_create_contracts_table::Migration),
        ]
    }
}
