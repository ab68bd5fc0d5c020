use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::TopicRecord;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, ensure_deleted, not_blank, now};
use crate::entity::{subject, topic};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TopicBody {
    #[validate(length(min = 1))]
    pub subject_id: String,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFilter {
    pub subject_id: Option<String>,
}

async fn ensure_parent(state: &AppState, subject_id: &str) -> Result<(), ApiError> {
    subject::Entity::find_by_id(subject_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("subject not found: {subject_id}")))?;
    Ok(())
}

#[tracing::instrument(name = "GET /admin/topics", skip(state, user))]
pub async fn list_topics(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<TopicFilter>,
) -> Result<Json<Vec<TopicRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = topic::Entity::find();
    if let Some(subject_id) = &filter.subject_id {
        query = query.filter(topic::Column::SubjectId.eq(subject_id.as_str()));
    }
    let models = query
        .order_by_asc(topic::Column::DisplayOrder)
        .order_by_asc(topic::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/topics/{id}", skip(state, user))]
pub async fn get_topic(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<TopicRecord>, ApiError> {
    user.require_admin()?;

    let model = topic::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("topic not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/topics", skip(state, user, body))]
pub async fn create_topic(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<TopicBody>,
) -> Result<Json<TopicRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;
    ensure_parent(&state, &body.subject_id).await?;

    let now = now();
    let model = topic::ActiveModel {
        id: Set(eduhub::create_id()),
        subject_id: Set(body.subject_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(topic_id = %model.id, subject_id = %model.subject_id, "Topic created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/topics/{id}", skip(state, user, body))]
pub async fn update_topic(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<TopicBody>,
) -> Result<Json<TopicRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = topic::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("topic not found: {id}")))?;

    if existing.subject_id != body.subject_id {
        ensure_parent(&state, &body.subject_id).await?;
    }

    let mut active = existing.into_active_model();
    active.subject_id = Set(body.subject_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(topic_id = %model.id, "Topic updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/topics/{id}", skip(state, user))]
pub async fn delete_topic(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let result = topic::Entity::delete_by_id(&id).exec(&state.db).await?;
    ensure_deleted(result, "topic", &id)?;
    Ok(StatusCode::NO_CONTENT)
}
