use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::ModuleRecord;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, ensure_deleted, not_blank, now};
use crate::entity::{module, topic};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModuleBody {
    #[validate(length(min = 1))]
    pub topic_id: String,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_project: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFilter {
    pub topic_id: Option<String>,
}

async fn ensure_parent(state: &AppState, topic_id: &str) -> Result<(), ApiError> {
    topic::Entity::find_by_id(topic_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("topic not found: {topic_id}")))?;
    Ok(())
}

#[tracing::instrument(name = "GET /admin/modules", skip(state, user))]
pub async fn list_modules(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<ModuleFilter>,
) -> Result<Json<Vec<ModuleRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = module::Entity::find();
    if let Some(topic_id) = &filter.topic_id {
        query = query.filter(module::Column::TopicId.eq(topic_id.as_str()));
    }
    let models = query
        .order_by_asc(module::Column::DisplayOrder)
        .order_by_asc(module::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/modules/{id}", skip(state, user))]
pub async fn get_module(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<ModuleRecord>, ApiError> {
    user.require_admin()?;

    let model = module::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("module not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/modules", skip(state, user, body))]
pub async fn create_module(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<ModuleBody>,
) -> Result<Json<ModuleRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;
    ensure_parent(&state, &body.topic_id).await?;

    let now = now();
    let model = module::ActiveModel {
        id: Set(eduhub::create_id()),
        topic_id: Set(body.topic_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        is_project: Set(body.is_project),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(module_id = %model.id, topic_id = %model.topic_id, "Module created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/modules/{id}", skip(state, user, body))]
pub async fn update_module(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<ModuleBody>,
) -> Result<Json<ModuleRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = module::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("module not found: {id}")))?;

    if existing.topic_id != body.topic_id {
        ensure_parent(&state, &body.topic_id).await?;
    }

    let mut active = existing.into_active_model();
    active.topic_id = Set(body.topic_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.is_project = Set(body.is_project);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(module_id = %model.id, "Module updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/modules/{id}", skip(state, user))]
pub async fn delete_module(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let result = module::Entity::delete_by_id(&id).exec(&state.db).await?;
    ensure_deleted(result, "module", &id)?;
    Ok(StatusCode::NO_CONTENT)
}
