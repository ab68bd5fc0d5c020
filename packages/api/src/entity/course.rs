//! `SeaORM` Entity for courses

use eduhub::model::CourseRecord;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::json_columns::StringList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "courseTypeId", column_type = "Text")]
    pub course_type_id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub skills: StringList,
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
    #[sea_orm(
        belongs_to = "super::course_type::Entity",
        from = "Column::CourseTypeId",
        to = "super::course_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    CourseType,
    #[sea_orm(has_many = "super::class::Entity")]
    Class,
    #[sea_orm(has_many = "super::exam::Entity")]
    Exam,
}

impl Related<super::course_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseType.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CourseRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            course_type_id: m.course_type_id,
            name: m.name,
            description: m.description,
            skills: m.skills.0,
            display_order: m.display_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
