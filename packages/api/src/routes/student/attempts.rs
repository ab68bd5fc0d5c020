use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use eduhub::model::{Difficulty, QuestionRecord};
use eduhub::scoring::{
    AttemptRecord, OnlineTestRecord, ensure_within_duration, score_attempt,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::json_columns::{AnswerSheet, ScoreCard};
use crate::entity::{online_test, question, test_attempt};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

/// A question as shown during an attempt, without the answer key.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub marks: Decimal,
    pub negative_marks: Decimal,
}

impl From<QuestionRecord> for QuestionView {
    fn from(q: QuestionRecord) -> Self {
        Self {
            id: q.id,
            text: q.text,
            options: q.options,
            difficulty: q.difficulty,
            marks: q.marks,
            negative_marks: q.negative_marks,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedAttempt {
    pub attempt: AttemptRecord,
    pub test: OnlineTestRecord,
    pub questions: Vec<QuestionView>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SubmitRequest {
    /// Question id to chosen option index
    #[serde(default)]
    pub answers: BTreeMap<String, i32>,
}

/// Loads the test's questions in the order the test lists them.
async fn test_questions<C: ConnectionTrait>(
    db: &C,
    test: &OnlineTestRecord,
) -> Result<Vec<QuestionRecord>, ApiError> {
    let mut by_id: BTreeMap<String, QuestionRecord> = question::Entity::find()
        .filter(question::Column::Id.is_in(test.question_ids.iter().map(String::as_str)))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id.clone(), QuestionRecord::from(m)))
        .collect();

    Ok(test
        .question_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect())
}

async fn find_own_attempt<C: ConnectionTrait>(
    db: &C,
    id: &str,
    sub: &str,
) -> Result<test_attempt::Model, ApiError> {
    test_attempt::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|attempt| attempt.user_id == sub)
        .ok_or_else(|| ApiError::not_found(format!("attempt not found: {id}")))
}

#[tracing::instrument(name = "POST /student/tests/{id}/attempts", skip(state, user))]
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<StartedAttempt>, ApiError> {
    let sub = user.sub()?;

    let test: OnlineTestRecord = online_test::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| ApiError::not_found(format!("test not found: {id}")))?
        .into();
    let questions = test_questions(&state.db, &test).await?;

    let model = test_attempt::ActiveModel {
        id: Set(eduhub::create_id()),
        test_id: Set(test.id.clone()),
        user_id: Set(sub),
        started_at: Set(Utc::now().naive_utc()),
        submitted_at: Set(None),
        answers: Set(AnswerSheet::default()),
        score: Set(None),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(attempt_id = %model.id, test_id = %test.id, "Attempt started");
    Ok(Json(StartedAttempt {
        attempt: model.into(),
        test,
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(name = "GET /student/attempts/{id}", skip(state, user))]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<AttemptRecord>, ApiError> {
    let sub = user.sub()?;
    let model = find_own_attempt(&state.db, &id, &sub).await?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /student/attempts/{id}/submit", skip(state, user, request))]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<AttemptRecord>, ApiError> {
    let sub = user.sub()?;
    let now = Utc::now().naive_utc();

    let txn = state.db.begin().await?;
    let attempt = find_own_attempt(&txn, &id, &sub).await?;
    if attempt.submitted_at.is_some() {
        return Err(ApiError::conflict(format!("attempt {id} was already submitted")));
    }

    let test: OnlineTestRecord = online_test::Entity::find_by_id(&attempt.test_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("test not found: {}", attempt.test_id)))?
        .into();
    ensure_within_duration(&test, attempt.started_at, now)?;

    let questions = test_questions(&txn, &test).await?;
    let score = score_attempt(&questions, &request.answers)?;

    let mut active = attempt.into_active_model();
    active.submitted_at = Set(Some(now));
    active.answers = Set(AnswerSheet(request.answers));
    active.score = Set(Some(ScoreCard(score.clone())));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    metrics::counter!("test_submissions_total").increment(1);
    tracing::info!(
        attempt_id = %model.id,
        test_id = %test.id,
        score = %score.score,
        percentage = %score.percentage,
        "Attempt submitted"
    );
    Ok(Json(model.into()))
}
