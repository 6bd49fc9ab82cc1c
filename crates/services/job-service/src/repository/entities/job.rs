//! Job database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Job, JobStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub budget: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Job {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&model.status).ok_or_else(|| {
            AppError::internal(format!("unknown status '{}' in jobs", model.status))
        })?;

        Ok(Job {
            id: model.id,
            employer_id: model.employer_id,
            title: model.title,
            description: model.description,
            budget: model.budget,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
