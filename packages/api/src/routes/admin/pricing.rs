use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::NaiveDateTime;
use eduhub::model::{
    EntityKind, OfferWindow, PricingLevel, PricingRecord, SellableRef, Tier,
};
use eduhub::pricing::discount::{validate_base_price, validate_discount_percent};
use eduhub::pricing::{
    BulkDiscountOutcome, BulkDiscountRequest, DiscountQuote, PricingDropdownEntry,
};
use eduhub::store::CatalogueRead;
use rust_decimal::Decimal;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::now;
use crate::entity::pricing_config;
use crate::store::DbStore;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBody {
    pub level: PricingLevel,
    pub entity_id: String,
    pub tier: Tier,
    pub base_price: Decimal,
    #[serde(default)]
    pub discount_percent: i32,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
}

impl PricingBody {
    fn validate(&self) -> Result<OfferWindow, ApiError> {
        if self.entity_id.trim().is_empty() {
            return Err(ApiError::validation("entityId must not be blank"));
        }
        validate_base_price(self.base_price)?;
        validate_discount_percent(self.discount_percent)?;
        let window = OfferWindow::new(self.valid_from, self.valid_to);
        window.validate()?;
        Ok(window)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub pricing: PricingRecord,
    /// What a student would pay right now
    pub quote: DiscountQuote,
}

fn sellable_kind(level: PricingLevel) -> Option<EntityKind> {
    match level {
        PricingLevel::CourseType => None,
        PricingLevel::Course => Some(EntityKind::Course),
        PricingLevel::Class => Some(EntityKind::Class),
        PricingLevel::Exam => Some(EntityKind::Exam),
    }
}

/// Resolves the owning course type, failing when the entity does not exist.
async fn owning_course_type<R: CatalogueRead + ?Sized>(
    reader: &R,
    level: PricingLevel,
    entity_id: &str,
) -> Result<String, ApiError> {
    match sellable_kind(level) {
        None => {
            let course_type = reader.course_type(entity_id).await?.ok_or_else(|| {
                ApiError::not_found(format!("course type not found: {entity_id}"))
            })?;
            Ok(course_type.id)
        }
        Some(kind) => {
            let sellable = SellableRef::new(kind, entity_id);
            Ok(eduhub::pricing::course_type_of(reader, &sellable).await?)
        }
    }
}

#[tracing::instrument(name = "PUT /admin/pricing", skip(state, user, body))]
pub async fn upsert_pricing(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<PricingBody>,
) -> Result<Json<PricingResponse>, ApiError> {
    user.require_admin()?;
    let window = body.validate()?;
    let now = now();

    let txn = state.db.begin().await?;
    let course_type_id = owning_course_type(&DbStore::new(&txn), body.level, &body.entity_id).await?;

    let existing = pricing_config::Entity::find()
        .filter(pricing_config::Column::Level.eq(body.level))
        .filter(pricing_config::Column::EntityId.eq(body.entity_id.as_str()))
        .filter(pricing_config::Column::Tier.eq(body.tier))
        .one(&txn)
        .await?;

    let row = match existing {
        Some(model) => {
            let mut row = PricingRecord::from(model);
            row.course_type_id = course_type_id;
            row.base_price = body.base_price;
            row.discount_percent = body.discount_percent;
            row.valid_from = window.valid_from;
            row.valid_to = window.valid_to;
            row.updated_at = now;
            pricing_config::ActiveModel::from(&row).update(&txn).await?;
            row
        }
        None => {
            let row = PricingRecord {
                id: eduhub::create_id(),
                course_type_id,
                level: body.level,
                entity_id: body.entity_id,
                tier: body.tier,
                base_price: body.base_price,
                discount_percent: body.discount_percent,
                valid_from: window.valid_from,
                valid_to: window.valid_to,
                created_at: now,
                updated_at: now,
            };
            pricing_config::ActiveModel::from(&row).insert(&txn).await?;
            row
        }
    };
    txn.commit().await?;

    tracing::info!(
        pricing_id = %row.id,
        level = row.level.as_str(),
        entity_id = %row.entity_id,
        tier = row.tier.as_str(),
        "Pricing saved"
    );

    let quote = eduhub::pricing::quote(row.base_price, row.discount_percent, &row.window(), now)?;
    Ok(Json(PricingResponse { pricing: row, quote }))
}

#[tracing::instrument(name = "GET /admin/pricing/dropdown/{course_type_id}/{level}", skip(state, user))]
pub async fn pricing_dropdown(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path((course_type_id, level)): Path<(String, String)>,
) -> Result<Json<Vec<PricingDropdownEntry>>, ApiError> {
    user.require_admin()?;
    let level: PricingLevel = level.parse()?;

    let txn = state
        .db
        .begin_with_config(None, Some(AccessMode::ReadOnly))
        .await?;
    let entries =
        eduhub::pricing::pricing_dropdown(&DbStore::new(&txn), &course_type_id, level, now())
            .await?;
    txn.commit().await?;

    Ok(Json(entries))
}

#[tracing::instrument(name = "POST /admin/pricing/bulk-discount", skip(state, user, body))]
pub async fn bulk_discount(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<BulkDiscountRequest>,
) -> Result<Json<BulkDiscountOutcome>, ApiError> {
    let admin = user.require_admin()?;
    body.validate()?;

    let txn = state.db.begin().await?;
    let outcome = {
        let mut store = DbStore::new(&txn);
        eduhub::pricing::apply_bulk_discount(&mut store, &body, now()).await?
    };
    // Dropping an uncommitted transaction rolls it back, so an error above
    // leaves every row untouched
    txn.commit().await?;

    tracing::info!(
        admin = %admin,
        course_type_id = %body.course_type_id,
        updated = outcome.updated,
        "Bulk discount committed"
    );
    metrics::counter!("bulk_discount_rows_total").increment(outcome.updated as u64);

    Ok(Json(outcome))
}
