use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::{Difficulty, QuestionRecord};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::{default_true, ensure_deleted, not_blank, now};
use crate::entity::{chapter, question};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_answer_key"))]
pub struct QuestionBody {
    #[validate(length(min = 1))]
    pub chapter_id: String,
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub text: String,
    #[validate(length(min = 2, message = "a question needs at least two options"))]
    pub options: Vec<String>,
    pub correct_option: i32,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    pub marks: Decimal,
    #[serde(default)]
    pub negative_marks: Decimal,
    pub explanation: Option<String>,
    #[serde(default)]
    pub exam_history: Vec<String>,
    #[serde(default)]
    pub suitable_for: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFilter {
    pub chapter_id: Option<String>,
    pub difficulty: Option<Difficulty>,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_answer_key(body: &QuestionBody) -> Result<(), ValidationError> {
    let in_range = usize::try_from(body.correct_option).is_ok_and(|i| i < body.options.len());
    if !in_range {
        return Err(invalid("correctOption", "must index into options"));
    }
    if body.options.iter().any(|o| o.trim().is_empty()) {
        return Err(invalid("options", "must not be blank"));
    }
    if body.marks < Decimal::ZERO {
        return Err(invalid("marks", "must not be negative"));
    }
    if body.negative_marks < Decimal::ZERO {
        return Err(invalid("negativeMarks", "must not be negative"));
    }
    Ok(())
}

async fn ensure_parent(state: &AppState, chapter_id: &str) -> Result<(), ApiError> {
    chapter::Entity::find_by_id(chapter_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chapter not found: {chapter_id}")))?;
    Ok(())
}

#[tracing::instrument(name = "GET /admin/questions", skip(state, user))]
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<QuestionRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = question::Entity::find();
    if let Some(chapter_id) = &filter.chapter_id {
        query = query.filter(question::Column::ChapterId.eq(chapter_id.as_str()));
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.filter(question::Column::Difficulty.eq(difficulty));
    }
    let models = query
        .order_by_asc(question::Column::DisplayOrder)
        .order_by_asc(question::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/questions/{id}", skip(state, user))]
pub async fn get_question(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<QuestionRecord>, ApiError> {
    user.require_admin()?;

    let model = question::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/questions", skip(state, user, body))]
pub async fn create_question(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<QuestionBody>,
) -> Result<Json<QuestionRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;
    ensure_parent(&state, &body.chapter_id).await?;

    let now = now();
    let model = question::ActiveModel {
        id: Set(eduhub::create_id()),
        chapter_id: Set(body.chapter_id),
        text: Set(body.text.trim().to_string()),
        options: Set(body.options.into()),
        correct_option: Set(body.correct_option),
        difficulty: Set(body.difficulty),
        marks: Set(body.marks),
        negative_marks: Set(body.negative_marks),
        explanation: Set(body.explanation),
        exam_history: Set(body.exam_history.into()),
        suitable_for: Set(body.suitable_for.into()),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(question_id = %model.id, chapter_id = %model.chapter_id, "Question created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/questions/{id}", skip(state, user, body))]
pub async fn update_question(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<QuestionBody>,
) -> Result<Json<QuestionRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = question::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question not found: {id}")))?;

    if existing.chapter_id != body.chapter_id {
        ensure_parent(&state, &body.chapter_id).await?;
    }

    let mut active = existing.into_active_model();
    active.chapter_id = Set(body.chapter_id);
    active.text = Set(body.text.trim().to_string());
    active.options = Set(body.options.into());
    active.correct_option = Set(body.correct_option);
    active.difficulty = Set(body.difficulty);
    active.marks = Set(body.marks);
    active.negative_marks = Set(body.negative_marks);
    active.explanation = Set(body.explanation);
    active.exam_history = Set(body.exam_history.into());
    active.suitable_for = Set(body.suitable_for.into());
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(question_id = %model.id, "Question updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/questions/{id}", skip(state, user))]
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let result = question::Entity::delete_by_id(&id).exec(&state.db).await?;
    ensure_deleted(result, "question", &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuestionBody {
        serde_json::from_value(serde_json::json!({
            "chapterId": "ch-1",
            "text": "2 + 2 = ?",
            "options": ["3", "4", "5"],
            "correctOption": 1,
            "marks": "4",
            "negativeMarks": "1"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_question() {
        let body = sample();
        assert_eq!(body.difficulty, Difficulty::Medium);
        assert!(body.is_active);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_answer_key_must_index_options() {
        let mut body = sample();
        body.correct_option = 3;
        assert!(body.validate().is_err());

        body.correct_option = -1;
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_needs_two_options_and_non_negative_marks() {
        let mut body = sample();
        body.options = vec!["only".into()];
        body.correct_option = 0;
        assert!(body.validate().is_err());

        let mut body = sample();
        body.negative_marks = Decimal::NEGATIVE_ONE;
        assert!(body.validate().is_err());
    }

    #[tokio::test]
    async fn test_answer_key_error_names_the_field() {
        let mut body = sample();
        body.correct_option = 7;
        let err = ApiError::from(body.validate().unwrap_err());

        let response = axum::response::IntoResponse::into_response(err);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(
            json["details"],
            serde_json::json!(["correctOption: must index into options"])
        );
    }
}
