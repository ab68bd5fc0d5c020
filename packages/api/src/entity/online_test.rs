//! `SeaORM` Entity for online tests

use eduhub::scoring::OnlineTestRecord;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::json_columns::StringList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "OnlineTest")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "questionIds", column_type = "JsonBinary")]
    pub question_ids: StringList,
    #[sea_orm(column_name = "durationMinutes")]
    pub duration_minutes: i32,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_attempt::Entity")]
    TestAttempt,
}

impl Related<super::test_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestAttempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OnlineTestRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            question_ids: m.question_ids.0,
            duration_minutes: m.duration_minutes,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
