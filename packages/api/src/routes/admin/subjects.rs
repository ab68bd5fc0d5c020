use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduhub::model::{EntityKind, SellableRef, SubjectRecord};
use eduhub::store::CatalogueRead;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use validator::Validate;

use super::{default_true, ensure_deleted, not_blank, now};
use crate::entity::subject;
use crate::store::DbStore;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBody {
    #[serde(rename = "parentType")]
    pub parent_kind: EntityKind,
    #[validate(length(min = 1))]
    pub parent_id: String,
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
pub struct SubjectFilter {
    #[serde(rename = "parentType")]
    pub parent_kind: Option<EntityKind>,
    pub parent_id: Option<String>,
}

/// A subject must hang off the entity kind its course type prescribes:
/// classes for academic, exams for competitive, courses for professional.
async fn ensure_parent<C: ConnectionTrait>(
    db: &C,
    parent_kind: EntityKind,
    parent_id: &str,
) -> Result<(), ApiError> {
    let store = DbStore::new(db);
    let parent = SellableRef::new(parent_kind, parent_id);
    let course_type_id = eduhub::pricing::course_type_of(&store, &parent).await?;
    let course_type = store
        .course_type(&course_type_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("course type not found: {course_type_id}")))?;

    let expected = course_type.kind.subject_parent();
    if expected != parent_kind {
        return Err(ApiError::bad_request(format!(
            "subjects of {} courses belong to a {}, not a {}",
            course_type.kind.as_str(),
            expected.as_str(),
            parent_kind.as_str()
        )));
    }
    Ok(())
}

#[tracing::instrument(name = "GET /admin/subjects", skip(state, user))]
pub async fn list_subjects(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(filter): Query<SubjectFilter>,
) -> Result<Json<Vec<SubjectRecord>>, ApiError> {
    user.require_admin()?;

    let mut query = subject::Entity::find();
    if let Some(parent_kind) = filter.parent_kind {
        query = query.filter(subject::Column::ParentKind.eq(parent_kind));
    }
    if let Some(parent_id) = &filter.parent_id {
        query = query.filter(subject::Column::ParentId.eq(parent_id.as_str()));
    }
    let models = query
        .order_by_asc(subject::Column::DisplayOrder)
        .order_by_asc(subject::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /admin/subjects/{id}", skip(state, user))]
pub async fn get_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<Json<SubjectRecord>, ApiError> {
    user.require_admin()?;

    let model = subject::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("subject not found: {id}")))?;
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "POST /admin/subjects", skip(state, user, body))]
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<SubjectBody>,
) -> Result<Json<SubjectRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;
    ensure_parent(&state.db, body.parent_kind, &body.parent_id).await?;

    let now = now();
    let model = subject::ActiveModel {
        id: Set(eduhub::create_id()),
        parent_kind: Set(body.parent_kind),
        parent_id: Set(body.parent_id),
        name: Set(body.name.trim().to_string()),
        description: Set(body.description),
        display_order: Set(body.display_order),
        is_active: Set(body.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        subject_id = %model.id,
        parent_kind = model.parent_kind.as_str(),
        parent_id = %model.parent_id,
        "Subject created"
    );
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "PUT /admin/subjects/{id}", skip(state, user, body))]
pub async fn update_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
    Json(body): Json<SubjectBody>,
) -> Result<Json<SubjectRecord>, ApiError> {
    user.require_admin()?;
    body.validate()?;

    let existing = subject::Entity::find_by_id(&id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("subject not found: {id}")))?;

    if existing.parent_kind != body.parent_kind || existing.parent_id != body.parent_id {
        ensure_parent(&state.db, body.parent_kind, &body.parent_id).await?;
    }

    let mut active = existing.into_active_model();
    active.parent_kind = Set(body.parent_kind);
    active.parent_id = Set(body.parent_id);
    active.name = Set(body.name.trim().to_string());
    active.description = Set(body.description);
    active.display_order = Set(body.display_order);
    active.is_active = Set(body.is_active);
    active.updated_at = Set(now());

    let model = active.update(&state.db).await?;
    tracing::info!(subject_id = %model.id, "Subject updated");
    Ok(Json(model.into()))
}

#[tracing::instrument(name = "DELETE /admin/subjects/{id}", skip(state, user))]
pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    let result = subject::Entity::delete_by_id(&id).exec(&state.db).await?;
    ensure_deleted(result, "subject", &id)?;
    Ok(StatusCode::NO_CONTENT)
}
