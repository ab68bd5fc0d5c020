use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::{CourseTypeKind, EntityKind, ExamRecord};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use super::courses::course_kind;
use super::{default_true, delete_dependents, ensure_deleted, not_blank, now};
use crate::entity::exam;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExamBody {
    #[validate(length(min = 1))]
    pub course_id: String,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub conducting_body: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFilter {
    pub course_id: Option<String>,
}

#[tracing::instrument(name = "GET /admin/exams", skip(state, user))]
pub async fn list_exams(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<ExamFilter>,
) -> Result<Json<Vec<ExamRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = exam::Entity::find();
    if let Some(course_id) = &filter.course_id {
        query = query.filter(exam::Column::CourseId.eq(course_id.as_str()));
    }
    let models = query
        .order_by_asc(exam::Column::DisplayOrder)
        .order_by_asc(exam::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/exams/{id}", skip(state, user))]
pub async fn get_exam(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<ExamRecord>, ApiError> {
    user.require_admin()?;

    let model = exam::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("exam not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/exams", skip(state, user, body))]
pub async fn create_exam(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<ExamBody>,
) -> Result<Json<ExamRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    if course_kind(&state.db, &body.course_id).await? != CourseTypeKind::Competitive {
        return Err(ApiError::bad_request("exams belong to competitive courses only"));
    }

    let now = now();
    let model = exam::ActiveModel {
        id: Set(eduhub::create_id()),
        course_id: Set(body.course_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        conducting_body: Set(body.conducting_body),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(exam_id = %model.id, course_id = %model.course_id, "Exam created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/exams/{id}", skip(state, user, body))]
pub async fn update_exam(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<ExamBody>,
) -> Result<Json<ExamRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = exam::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("exam not found: {id}")))?;

    if existing.course_id != body.course_id
        && course_kind(&state.db, &body.course_id).await? != CourseTypeKind::Competitive
    {
        return Err(ApiError::bad_request("exams belong to competitive courses only"));
    }

    let mut active = existing.into_active_model();
    active.course_id = Set(body.course_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.conducting_body = Set(body.conducting_body);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(exam_id = %model.id, "Exam updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/exams/{id}", skip(state, user))]
pub async fn delete_exam(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let txn = state.db.begin().await?;
    delete_dependents(&txn, EntityKind::Exam, std::slice::from_ref(&id)).await?;
    let result = exam::Entity::delete_by_id(&id).exec(&txn).await?;
    ensure_deleted(result, "exam", &id)?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
