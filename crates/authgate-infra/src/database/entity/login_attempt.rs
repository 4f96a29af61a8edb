//! Login attempt entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use authgate_core::domain::AttemptRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "login_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ip_address: String,
    pub email: String,
    pub success: bool,
    pub attempted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from domain AttemptRecord to SeaORM ActiveModel.
impl From<AttemptRecord> for ActiveModel {
    fn from(record: AttemptRecord) -> Self {
        Self {
            id: Set(record.id),
            ip_address: Set(record.key.ip_address().to_string()),
            email: Set(record.key.email().to_string()),
            success: Set(!record.outcome.is_failure()),
            attempted_at: Set(record.attempted_at.into()),
        }
    }
}
