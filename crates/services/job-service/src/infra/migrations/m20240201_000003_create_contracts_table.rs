//! Migration: Create contracts table. One contract per application.

use sea_orm_migration::prelude::*;

use super::m20240201_000001_create_jobs_table::Jobs;
use super::m20240201_000002_create_applications_table::Applications;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contracts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Contracts::JobId).uuid().not_null())
                    .col(
                        ColumnDef::new(Contracts::ApplicationId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Contracts::EmployerId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::ApplicantId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Contracts::Terms).text().null())
                    .col(
                        ColumnDef::new(Contracts::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Contracts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contracts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contracts_job_id")
                            .from(Contracts::Table, Contracts::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contracts_application_id")
                            .from(Contracts::Table, Contracts::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_parties")
                    .table(Contracts::Table)
                    .col(Contracts::EmployerId)
                    .col(Contracts::ApplicantId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contracts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Contracts {
    Table,
    Id,
    JobId,
    ApplicationId,
    EmployerId,
    ApplicantId,
    Amount,
    Terms,
    Status,
    CreatedAt,
    UpdatedAt,
}
