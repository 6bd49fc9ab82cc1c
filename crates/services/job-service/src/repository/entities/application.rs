//! Application database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Application, ApplicationStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub cover_letter: Option<String>,
    pub proposed_rate: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id",
        on_delete = "Cascade"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Application {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::parse(&model.status).ok_or_else(|| {
            AppError::internal(format!("unknown status '{}' in applications", model.status))
        })?;

        Ok(Application {
            id: model.id,
            job_id: model.job_id,
            applicant_id: model.applicant_id,
            cover_letter: model.cover_letter,
            proposed_rate: model.proposed_rate,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
