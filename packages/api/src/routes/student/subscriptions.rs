use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{NaiveDateTime, Utc};
use eduhub::error::EduError;
use eduhub::model::PaymentStatus;
use eduhub::subscription::SubscriptionRecord;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::entity::subscription;
use crate::payment::webhook::PaymentOutcome;
use crate::{error::ApiError, middleware::jwt::AppUser, state::AppState};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    /// Only subscriptions granting access right now
    #[serde(default)]
    pub active: bool,
}

#[tracing::instrument(name = "GET /student/subscriptions", skip(state, user))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<Vec<SubscriptionRecord>>, ApiError> {
    let sub = user.sub()?;
    let now = Utc::now().naive_utc();

    let mut records: Vec<SubscriptionRecord> = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(sub.as_str()))
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    if query.active {
        records.retain(|s| s.grants_access_at(now));
    }
    Ok(Json(records))
}

/// Paid subscriptions of a user, the only ones that can grant access.
pub(crate) async fn paid_subscriptions<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<Vec<SubscriptionRecord>, ApiError> {
    let models = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::Status.eq(PaymentStatus::Paid))
        .all(db)
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

/// Result of applying a gateway outcome to a stored subscription.
#[derive(Debug)]
pub(crate) enum Settlement {
    /// No subscription carries the order
    UnknownOrder,
    Settled(SubscriptionRecord),
    /// The outcome contradicts the recorded status, e.g. a failure reported
    /// after the order was already paid. The row is left untouched.
    Stale(SubscriptionRecord, EduError),
}

/// Applies a gateway outcome to the subscription that owns `order_id`.
///
/// Repeated outcomes leave the row untouched.
pub(crate) async fn settle_order<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
    outcome: PaymentOutcome,
    payment_id: Option<String>,
    now: NaiveDateTime,
) -> Result<Settlement, ApiError> {
    let Some(model) = subscription::Entity::find()
        .filter(subscription::Column::GatewayOrderId.eq(order_id))
        .one(db)
        .await?
    else {
        return Ok(Settlement::UnknownOrder);
    };

    let mut record = SubscriptionRecord::from(model);
    let applied = match outcome {
        PaymentOutcome::Paid => record.mark_paid(payment_id, now),
        PaymentOutcome::Failed => record.mark_failed(payment_id, now),
    };

    let changed = match applied {
        Ok(changed) => changed,
        Err(err @ EduError::InvalidTransition { .. }) => {
            return Ok(Settlement::Stale(record, err));
        }
        Err(err) => return Err(err.into()),
    };

    if changed {
        subscription::ActiveModel::from(&record).update(db).await?;
        tracing::info!(
            subscription_id = %record.id,
            order_id,
            status = record.status.as_str(),
            "Subscription payment settled"
        );
    } else {
        tracing::debug!(subscription_id = %record.id, order_id, "Payment outcome already applied");
    }

    Ok(Settlement::Settled(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, mock_db, statement_log, subscription_row};

    #[tokio::test]
    async fn test_settle_pending_order_as_paid() {
        let db = mock_db()
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Pending)]])
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Paid)]])
            .into_connection();

        let settlement = settle_order(
            &db,
            "order_1",
            PaymentOutcome::Paid,
            Some("pay_7".into()),
            at(12),
        )
        .await
        .unwrap();

        let Settlement::Settled(record) = settlement else {
            panic!("expected a settled subscription, got {settlement:?}");
        };
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.gateway_payment_id.as_deref(), Some("pay_7"));
        assert_eq!(record.starts_at, Some(at(12)));

        let log = statement_log(db);
        assert_eq!(log.len(), 2);
        assert!(log[1].contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_repeated_paid_outcome_leaves_row_untouched() {
        let db = mock_db()
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Paid)]])
            .into_connection();

        let settlement = settle_order(&db, "order_1", PaymentOutcome::Paid, None, at(12))
            .await
            .unwrap();

        let Settlement::Settled(record) = settlement else {
            panic!("expected a settled subscription, got {settlement:?}");
        };
        assert_eq!(record.starts_at, Some(at(9)));
        assert_eq!(statement_log(db).len(), 1);
    }

    #[tokio::test]
    async fn test_failure_after_payment_is_stale() {
        let db = mock_db()
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Paid)]])
            .into_connection();

        let settlement = settle_order(&db, "order_1", PaymentOutcome::Failed, None, at(12))
            .await
            .unwrap();

        let Settlement::Stale(record, err) = settlement else {
            panic!("expected a stale outcome, got {settlement:?}");
        };
        assert_eq!(record.status, PaymentStatus::Paid);
        assert!(matches!(err, EduError::InvalidTransition { .. }));

        let log = statement_log(db);
        assert_eq!(log.len(), 1);
        assert!(!log[0].contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let db = mock_db()
            .append_query_results([Vec::<subscription::Model>::new()])
            .into_connection();

        let settlement = settle_order(&db, "order_x", PaymentOutcome::Paid, None, at(12))
            .await
            .unwrap();
        assert!(matches!(settlement, Settlement::UnknownOrder));
    }
}
