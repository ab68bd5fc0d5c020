use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::{CourseRecord, CourseTypeKind};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, delete_course_dependents, ensure_deleted, not_blank, now};
use crate::entity::{course, course_type};
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseBody {
    #[validate(length(min = 1))]
    pub course_type_id: String,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    pub course_type_id: Option<String>,
}

/// Kind of the course type a course belongs to.
pub(crate) async fn course_kind<C: ConnectionTrait>(
    db: &C,
    course_id: &str,
) -> Result<CourseTypeKind, ApiError> {
    let (_, course_type) = course::Entity::find_by_id(course_id)
        .find_also_related(course_type::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course not found: {course_id}")))?;

    course_type
        .map(|ct| ct.kind)
        .ok_or_else(|| ApiError::internal(format!("course {course_id} has no course type")))
}

#[tracing::instrument(name = "GET /admin/courses", skip(state, user))]
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<CourseRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = course::Entity::find();
    if let Some(course_type_id) = &filter.course_type_id {
        query = query.filter(course::Column::CourseTypeId.eq(course_type_id.as_str()));
    }
    let models = query
        .order_by_asc(course::Column::DisplayOrder)
        .order_by_asc(course::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/courses/{id}", skip(state, user))]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<CourseRecord>, ApiError> {
    user.require_admin()?;

    let model = course::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/courses", skip(state, user, body))]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CourseBody>,
) -> Result<Json<CourseRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    course_type::Entity::find_by_id(&body.course_type_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("course type not found: {}", body.course_type_id))
        })?;

    let now = now();
    let model = course::ActiveModel {
        id: Set(eduhub::create_id()),
        course_type_id: Set(body.course_type_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        skills: Set(body.skills.into()),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(course_id = %model.id, course_type_id = %model.course_type_id, "Course created");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/courses/{id}", skip(state, user, body))]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<CourseBody>,
) -> Result<Json<CourseRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = course::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course not found: {id}")))?;

    // Moving a course would orphan its classes, exams and pricing rows
    if existing.course_type_id != body.course_type_id {
        return Err(ApiError::bad_request(
            "a course cannot move to another course type",
        ));
    }

    let mut active = existing.into_active_model();
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.skills = Set(body.skills.into());
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(course_id = %model.id, "Course updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/courses/{id}", skip(state, user))]
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let txn = state.db.begin().await?;
    delete_course_dependents(&txn, std::slice::from_ref(&id)).await?;
    let result = course::Entity::delete_by_id(&id).exec(&txn).await?;
    ensure_deleted(result, "course", &id)?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
