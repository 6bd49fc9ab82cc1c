//! Contract database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Contract, ContractStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    #[sea_orm(unique)]
    pub application_id: Uuid,
    pub employer_id: Uuid,
    pub applicant_id: Uuid,
    pub amount: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Contract {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = ContractStatus::parse(&model.status).ok_or_else(|| {
            AppError::internal(format!("unknown status '{}' in contracts", model.status))
        })?;

        Ok(Contract {
            id: model.id,
            job_id: model.job_id,
            application_id: model.application_id,
            employer_id: model.employer_id,
            applicant_id: model.applicant_id,
            amount: model.amount,
            terms: model.terms,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
