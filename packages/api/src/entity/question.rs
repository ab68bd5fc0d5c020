//! `SeaORM` Entity for questions

use eduhub::model::{Difficulty, QuestionRecord};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::json_columns::StringList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "chapterId", column_type = "Text")]
    pub chapter_id: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub options: StringList,
    /// Index into `options`
    #[sea_orm(column_name = "correctOption")]
    pub correct_option: i32,
    pub difficulty: Difficulty,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub marks: Decimal,
    #[sea_orm(column_name = "negativeMarks", column_type = "Decimal(Some((8, 2)))")]
    pub negative_marks: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub explanation: Option<String>,
    #[sea_orm(column_name = "examHistory", column_type = "JsonBinary")]
    pub exam_history: StringList,
    #[sea_orm(column_name = "suitableFor", column_type = "JsonBinary")]
    pub suitable_for: StringList,
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
        belongs_to = "super::chapter::Entity",
        from = "Column::ChapterId",
        to = "super::chapter::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Chapter,
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for QuestionRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            chapter_id: m.chapter_id,
            text: m.text,
            options: m.options.0,
            correct_option: m.correct_option,
            difficulty: m.difficulty,
            marks: m.marks,
            negative_marks: m.negative_marks,
            explanation: m.explanation,
            exam_history: m.exam_history.0,
            suitable_for: m.suitable_for.0,
            display_order: m.display_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
