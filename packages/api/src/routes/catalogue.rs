//! Public catalogue browsing. No login required.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use eduhub::catalogue::Catalogue;
use eduhub::model::{CourseTypeRecord, EntityKind, SellableRef, Tier};
use eduhub::pricing::{ResolvedPrice, TierPricing};
use sea_orm::{AccessMode, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::Deserialize;

use crate::entity::course_type;
use crate::store::DbStore;
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/course-types", get(list_course_types))
        .route("/course-types/{id}", get(get_catalogue))
        .route("/pricing/{kind}/{id}", get(get_pricing))
}

#[tracing::instrument(name = "GET /catalogue/course-types", skip(state))]
pub async fn list_course_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseTypeRecord>>, ApiError> {
    let models = course_type::Entity::find()
        .filter(course_type::Column::IsActive.eq(true))
        .order_by_asc(course_type::Column::DisplayOrder)
        .order_by_asc(course_type::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(name = "GET /catalogue/course-types/{id}", skip(state))]
pub async fn get_catalogue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Catalogue>, ApiError> {
    let txn = state
        .db
        .begin_with_config(None, Some(AccessMode::ReadOnly))
        .await?;
    let catalogue =
        eduhub::catalogue::compose_catalogue(&DbStore::new(&txn), &id, Utc::now().naive_utc())
            .await?;
    txn.commit().await?;
    Ok(Json(catalogue))
}

#[derive(Clone, Debug, Deserialize)]
pub struct PricingQuery {
    pub tier: Option<Tier>,
}

#[derive(Clone, Debug, serde::Serialize)]
#[serde(untagged)]
pub enum PricingResponse {
    Tier(ResolvedPrice),
    All(TierPricing),
}

#[tracing::instrument(name = "GET /catalogue/pricing/{kind}/{id}", skip(state))]
pub async fn get_pricing(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<PricingResponse>, ApiError> {
    let kind: EntityKind = kind.parse()?;
    let sellable = SellableRef::new(kind, id);
    let now = Utc::now().naive_utc();

    let txn = state
        .db
        .begin_with_config(None, Some(AccessMode::ReadOnly))
        .await?;
    let store = DbStore::new(&txn);
    let response = match query.tier {
        Some(tier) => PricingResponse::Tier(
            eduhub::pricing::resolve_price(&store, &sellable, tier, now).await?,
        ),
        None => PricingResponse::All(eduhub::pricing::resolve_tiers(&store, &sellable, now).await?),
    };
    txn.commit().await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::pricing_config;
    use crate::testing::{course_row, json_request, mock_db, pricing_row, send, state, state_log};
    use axum::http::StatusCode;
    use eduhub::model::PricingLevel;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_unknown_course_type_is_not_found() {
        let db = mock_db()
            .append_query_results([Vec::<course_type::Model>::new()])
            .into_connection();
        let state = state(db);

        let response = send(
            &state,
            json_request("GET", "/api/v1/catalogue/course-types/missing", None, ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        drop(response);
        let log = state_log(state);
        assert!(!log.iter().any(|txn| txn.contains("COMMIT")));
    }

    #[tokio::test]
    async fn test_course_without_own_price_falls_back_to_default() {
        let db = mock_db()
            .append_query_results([vec![course_row()]])
            .append_query_results([Vec::<pricing_config::Model>::new()])
            .append_query_results([vec![pricing_row(
                PricingLevel::CourseType,
                "ct_1",
                Decimal::new(99900, 2),
            )]])
            .into_connection();
        let state = state(db);

        let response = send(
            &state,
            json_request("GET", "/api/v1/catalogue/pricing/course/course_1?tier=MONTHLY", None, ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "DEFAULT");

        let log = state_log(state);
        assert_eq!(log.len(), 1);
        assert!(!log[0].contains("UPDATE"));
    }
}
