use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::ChapterRecord;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, ensure_deleted, not_blank, now};
use crate::entity::{chapter, module};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChapterBody {
    #[validate(length(min = 1))]
    pub module_id: String,
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
pub struct ChapterFilter {
    pub module_id: Option<String>,
}

async fn ensure_parent(state: &AppState, module_id: &str) -> Result<(), ApiError> {
    module::Entity::find_by_id(module_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("module not found: {module_id}")))?;
    Ok(())
}

#[tracing::instrument(name = "GET /admin/chapters", skip(state, user))]
pub async fn list_chapters(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<ChapterFilter>,
) -> Result<Json<Vec<ChapterRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = chapter::Entity::find();
    if let Some(module_id) = &filter.module_id {
        query = query.filter(chapter::Column::ModuleId.eq(module_id.as_str()));
    }
    let models = query
        .order_by_asc(chapter::Column::DisplayOrder)
        .order_by_asc(chapter::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/chapters/{id}", skip(state, user))]
pub async fn get_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<ChapterRecord>, ApiError> {
    user.require_admin()?;

    let model = chapter::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chapter not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/chapters", skip(state, user, body))]
pub async fn create_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<ChapterBody>,
) -> Result<Json<ChapterRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;
    ensure_parent(&state, &body.module_id).await?;

    let now = now();
    let model = chapter::ActiveModel {
        id: Set(eduhub::create_id()),
        module_id: Set(body.module_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(chapter_id = %model.id, module_id = %model.module_id, "Chapter created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/chapters/{id}", skip(state, user, body))]
pub async fn update_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<ChapterBody>,
) -> Result<Json<ChapterRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = chapter::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chapter not found: {id}")))?;

    if existing.module_id != body.module_id {
        ensure_parent(&state, &body.module_id).await?;
    }

    let mut active = existing.into_active_model();
    active.module_id = Set(body.module_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(chapter_id = %model.id, "Chapter updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/chapters/{id}", skip(state, user))]
pub async fn delete_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let result = chapter::Entity::delete_by_id(&id).exec(&state.db).await?;
    ensure_deleted(result, "chapter", &id)?;
    Ok(StatusCode::NO_CONTENT)
}
