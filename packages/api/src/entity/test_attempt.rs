//! `SeaORM` Entity for test attempts

use eduhub::scoring::AttemptRecord;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::json_columns::{AnswerSheet, ScoreCard};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "TestAttempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "testId", column_type = "Text")]
    pub test_id: String,
    #[sea_orm(column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_name = "startedAt")]
    pub started_at: DateTime,
    #[sea_orm(column_name = "submittedAt", nullable)]
    pub submitted_at: Option<DateTime>,
    #[sea_orm(column_type = "JsonBinary")]
    pub answers: AnswerSheet,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub score: Option<ScoreCard>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::online_test::Entity",
        from = "Column::TestId",
        to = "super::online_test::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    OnlineTest,
}

impl Related<super::online_test::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OnlineTest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AttemptRecord {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            test_id: m.test_id,
            user_id: m.user_id,
            started_at: m.started_at,
            submitted_at: m.submitted_at,
            answers: m.answers.0,
            score: m.score.map(|s| s.0),
        }
    }
}
