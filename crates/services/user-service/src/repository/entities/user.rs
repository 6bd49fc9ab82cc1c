//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{User, UserRole, UserStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity. A row with an unknown role or
/// status is corrupt data, not a client error.
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&model.role)
            .ok_or_else(|| AppError::internal(format!("unknown role '{}' in users", model.role)))?;
        let status = UserStatus::parse(&model.status).ok_or_else(|| {
            AppError::internal(format!("unknown status '{}' in users", model.status))
        })?;

        Ok(User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            display_name: model.display_name,
            role,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
