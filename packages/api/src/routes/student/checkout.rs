use axum::{Extension, Json, extract::State};
use chrono::Utc;
use eduhub::model::{EntityKind, PaymentStatus, SellableRef, Tier};
use eduhub::store::CatalogueRead;
use eduhub::subscription::{
    CheckoutQuote, SubscriptionRecord, checkout_quote, ensure_no_active_duplicate,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Statement, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::subscriptions::{Settlement, paid_subscriptions, settle_order};
use crate::entity::subscription;
use crate::payment::webhook::PaymentOutcome;
use crate::payment::{GatewayOrder, OrderRequest};
use crate::store::DbStore;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(rename = "entityType")]
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub tier: Tier,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub subscription: SubscriptionRecord,
    pub quote: CheckoutQuote,
    /// Absent for free checkouts, which are paid immediately
    pub order: Option<GatewayOrder>,
    pub key_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    /// When sent, must name the subscription owning the order
    pub subscription_id: Option<String>,
}

#[tracing::instrument(name = "POST /student/subscriptions/checkout", skip(state, user, request))]
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let sub = user.sub()?;
    let now = Utc::now().naive_utc();
    let sellable = SellableRef::new(request.entity_kind, request.entity_id);

    let txn = state.db.begin().await?;
    lock_user_checkouts(&txn, &sub).await?;

    let existing = paid_subscriptions(&txn, &sub).await?;
    ensure_no_active_duplicate(&existing, &sellable, request.tier, now)?;

    let store = DbStore::new(&txn);
    let quote = checkout_quote(&store, &sellable, request.tier, now).await?;
    let course_type = store
        .course_type(&quote.course_type_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("course type not found: {}", quote.course_type_id))
        })?;
    if course_type.kind.sellable() != sellable.kind {
        return Err(ApiError::bad_request(format!(
            "{} courses are sold per {}",
            course_type.kind.as_str(),
            course_type.kind.sellable().as_str()
        )));
    }

    let mut record = SubscriptionRecord {
        id: eduhub::create_id(),
        user_id: sub,
        course_type_id: quote.course_type_id.clone(),
        entity_kind: sellable.kind,
        entity_id: sellable.id.clone(),
        tier: quote.tier,
        amount: quote.amount,
        currency: state.config.currency.clone(),
        status: PaymentStatus::Pending,
        gateway_order_id: None,
        gateway_payment_id: None,
        starts_at: None,
        ends_at: None,
        created_at: now,
        updated_at: now,
    };

    let (order, key_id) = if quote.requires_payment() {
        let gateway = state.gateway()?;
        let order = gateway
            .create_order(&OrderRequest {
                amount: quote.amount_minor,
                currency: record.currency.clone(),
                receipt: record.id.clone(),
            })
            .await?;
        record.gateway_order_id = Some(order.id.clone());
        (Some(order), Some(gateway.key_id().to_string()))
    } else {
        record.mark_paid(None, now)?;
        (None, None)
    };

    subscription::ActiveModel::from(&record).insert(&txn).await?;
    txn.commit().await?;

    metrics::counter!(
        "checkouts_total",
        "tier" => record.tier.as_str(),
        "free" => (!quote.requires_payment()).to_string()
    )
    .increment(1);
    tracing::info!(
        subscription_id = %record.id,
        entity_kind = record.entity_kind.as_str(),
        entity_id = %record.entity_id,
        tier = record.tier.as_str(),
        amount = %record.amount,
        "Checkout created"
    );

    Ok(Json(CheckoutResponse {
        subscription: record,
        quote,
        order,
        key_id,
    }))
}

/// Serializes checkouts of one user until the surrounding transaction ends,
/// so the duplicate check and the insert see each other.
async fn lock_user_checkouts<C: ConnectionTrait>(db: &C, user_id: &str) -> Result<(), ApiError> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [user_id.into()],
    ))
    .await?;
    Ok(())
}

#[tracing::instrument(name = "POST /student/subscriptions/callback", skip(state, user, request))]
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<SubscriptionRecord>, ApiError> {
    let sub = user.sub()?;
    let gateway = state.gateway()?;

    if !gateway.verify_payment(&request.order_id, &request.payment_id, &request.signature) {
        tracing::warn!(order_id = %request.order_id, "Payment callback signature mismatch");
        return Err(ApiError::invalid_signature("Payment signature does not match"));
    }

    let txn = state.db.begin().await?;
    let settlement = settle_order(
        &txn,
        &request.order_id,
        PaymentOutcome::Paid,
        Some(request.payment_id),
        Utc::now().naive_utc(),
    )
    .await?;

    let record = match settlement {
        Settlement::Settled(record) => Some(record),
        Settlement::Stale(_, err) => return Err(err.into()),
        Settlement::UnknownOrder => None,
    }
    .filter(|record| {
        record.user_id == sub
            && request
                .subscription_id
                .as_deref()
                .is_none_or(|id| id == record.id)
    })
    .ok_or_else(|| ApiError::not_found(format!("order not found: {}", request.order_id)))?;
    txn.commit().await?;

    Ok(Json(record))
}
