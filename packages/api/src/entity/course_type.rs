//! `SeaORM` Entity for course types

use eduhub::model::{CourseTypeKind, CourseTypeRecord};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "CourseType")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    /// Decides whether courses hold classes, exams or content directly
    pub kind: CourseTypeKind,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "displayOrder")]
    pub display_order: i32,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course::Entity")]
    Course,
    #[sea_orm(has_many = "super::pricing_config::Entity")]
    PricingConfig,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::pricing_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PricingConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CourseTypeRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            kind: m.kind,
            description: m.description,
            display_order: m.display_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
