use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::{ClassRecord, CourseTypeKind, EntityKind};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use super::courses::course_kind;
use super::{default_true, delete_dependents, ensure_deleted, not_blank, now};
use crate::entity::class;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassBody {
    #[validate(length(min = 1))]
    pub course_id: String,
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
pub struct ClassFilter {
    pub course_id: Option<String>,
}

#[tracing::instrument(name = "GET /admin/classes", skip(state, user))]
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<ClassFilter>,
) -> Result<Json<Vec<ClassRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = class::Entity::find();
    if let Some(course_id) = &filter.course_id {
        query = query.filter(class::Column::CourseId.eq(course_id.as_str()));
    }
    let models = query
        .order_by_asc(class::Column::DisplayOrder)
        .order_by_asc(class::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/classes/{id}", skip(state, user))]
pub async fn get_class(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<ClassRecord>, ApiError> {
    user.require_admin()?;

    let model = class::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("class not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/classes", skip(state, user, body))]
pub async fn create_class(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<ClassBody>,
) -> Result<Json<ClassRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    if course_kind(&state.db, &body.course_id).await? != CourseTypeKind::Academic {
        return Err(ApiError::bad_request("classes belong to academic courses only"));
    }

    let now = now();
    let model = class::ActiveModel {
        id: Set(eduhub::create_id()),
        course_id: Set(body.course_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(class_id = %model.id, course_id = %model.course_id, "Class created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/classes/{id}", skip(state, user, body))]
pub async fn update_class(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<ClassBody>,
) -> Result<Json<ClassRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = class::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("class not found: {id}")))?;

    if existing.course_id != body.course_id
        && course_kind(&state.db, &body.course_id).await? != CourseTypeKind::Academic
    {
        return Err(ApiError::bad_request("classes belong to academic courses only"));
    }

    let mut active = existing.into_active_model();
    active.course_id = Set(body.course_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(class_id = %model.id, "Class updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/classes/{id}", skip(state, user))]
pub async fn delete_class(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let txn = state.db.begin().await?;
    delete_dependents(&txn, EntityKind::Class, std::slice::from_ref(&id)).await?;
    let result = class::Entity::delete_by_id(&id).exec(&txn).await?;
    ensure_deleted(result, "class", &id)?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
