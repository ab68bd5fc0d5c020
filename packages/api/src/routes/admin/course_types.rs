use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use eduhub::model::{CourseTypeKind, CourseTypeRecord};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, delete_course_dependents, ensure_deleted, not_blank, now};
use crate::entity::{course, course_type};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseTypeBody {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub kind: CourseTypeKind,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[tracing::instrument(name = "GET /admin/course-types", skip(state, user))]
pub async fn list_course_types(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<CourseTypeRecord>>, ApiError> {
    user.require_admin()?;

    let models = course_type::Entity::find()
        .order_by_asc(course_type::Column::DisplayOrder)
        .order_by_asc(course_type::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/course-types/{id}", skip(state, user))]
pub async fn get_course_type(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<CourseTypeRecord>, ApiError> {
    user.require_admin()?;

    let model = course_type::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course type not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/course-types", skip(state, user, body))]
pub async fn create_course_type(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CourseTypeBody>,
) -> Result<Json<CourseTypeRecord>, ApiError> {
    let sub = user.require_admin()?;
    body.validate()?;

    let now = now();
    let model = course_type::ActiveModel {
        id: Set(eduhub::create_id()),
        name: Set(body.name.trim().to_string()),
        kind: Set(body.kind),
        description: Set(body.description),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(course_type_id = %model.id, kind = model.kind.as_str(), admin = %sub, "Course type created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/course-types/{id}", skip(state, user, body))]
pub async fn update_course_type(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<CourseTypeBody>,
) -> Result<Json<CourseTypeRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = course_type::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course type not found: {id}")))?;

    if existing.kind != body.kind {
        let courses = course::Entity::find()
            .filter(course::Column::CourseTypeId.eq(id.as_str()))
            .count(&state.db)
            .await?;
        if courses > 0 {
            return Err(ApiError::conflict(format!(
                "course type {id} has {courses} courses, its kind cannot change"
            )));
        }
    }

    let mut active = existing.into_active_model();
    active.name = Set(body.name.trim().to_string());
    active.kind = Set(body.kind);
    active.description = Set(body.description);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(course_type_id = %model.id, "Course type updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/course-types/{id}", skip(state, user))]
pub async fn delete_course_type(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let txn = state.db.begin().await?;
    let course_ids: Vec<String> = course::Entity::find()
        .select_only()
        .column(course::Column::Id)
        .filter(course::Column::CourseTypeId.eq(id.as_str()))
        .into_tuple()
        .all(&txn)
        .await?;
    delete_course_dependents(&txn, &course_ids).await?;

    let result = course_type::Entity::delete_by_id(&id).exec(&txn).await?;
    ensure_deleted(result, "course type", &id)?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
