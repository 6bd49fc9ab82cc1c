//! Migration: Create applications table.
//!
//! An applicant may apply to a job once; deleting a job removes its
//! applications.

use sea_orm_migration::prelude::*;

use super::m20240201_000001_create_jobs_table::Jobs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Applications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Applications::JobId).uuid().not_null())
                    .col(ColumnDef::new(Applications::ApplicantId).uuid().not_null())
                    .col(ColumnDef::new(Applications::CoverLetter).text().null())
                    .col(ColumnDef::new(Applications::ProposedRate).big_integer().null())
                    .col(
                        ColumnDef::new(Applications::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_job_id")
                            .from(Applications::Table, Applications::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_job_applicant")
                    .table(Applications::Table)
                    .col(Applications::JobId)
                    .col(Applications::ApplicantId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Applications {
    Table,
    Id,
    JobId,
    ApplicantId,
    CoverLetter,
    ProposedRate,
    Status,
    CreatedAt,
    UpdatedAt,
}
