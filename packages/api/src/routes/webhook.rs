use crate::entity::gateway_event;
use crate::payment::webhook::{EVENT_ID_HEADER, PaymentEvent, SIGNATURE_HEADER, parse_event};
use crate::routes::student::subscriptions::{Settlement, settle_order};
use crate::{error::ApiError, state::AppState};
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, TransactionTrait};

pub fn routes() -> Router<AppState> {
    Router::new().route("/payment", post(payment_webhook))
}

/// Gateways may omit the event id header; the body hash is stable across
/// redeliveries of the same event.
fn event_id(headers: &HeaderMap, payload: &[u8]) -> String {
    headers
        .get(EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| blake3::hash(payload).to_hex().to_string())
}

#[tracing::instrument(name = "POST /webhook/payment", skip(state, headers, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = state.gateway()?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::invalid_signature("Missing webhook signature header"))?;

    if !gateway.verify_webhook(&payload, signature) {
        tracing::warn!("Webhook signature mismatch");
        return Err(ApiError::invalid_signature("Webhook signature does not match"));
    }

    let event = parse_event(&payload)?;
    let event_id = event_id(&headers, &payload);

    if is_event_processed(&state, &event_id).await? {
        tracing::info!(event_id = %event_id, "Duplicate event, skipping");
        return Ok(StatusCode::OK);
    }

    let txn = state.db.begin().await?;
    match handle_payment_event(&txn, &event).await {
        Ok(_) => {
            mark_event_processed(&txn, &event_id, &event.event_type).await?;
            txn.commit().await?;
            metrics::counter!("payment_events_total", "event" => event.event_type.clone())
                .increment(1);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, event_type = %event.event_type, "Failed to process webhook");
            Err(e)
        }
    }
}

async fn is_event_processed(state: &AppState, event_id: &str) -> Result<bool, ApiError> {
    let existing = gateway_event::Entity::find_by_id(event_id)
        .one(&state.db)
        .await?;

    Ok(existing.is_some())
}

async fn mark_event_processed<C: ConnectionTrait>(
    db: &C,
    event_id: &str,
    event_type: &str,
) -> Result<(), ApiError> {
    let new_event = gateway_event::ActiveModel {
        id: Set(event_id.to_string()),
        event_type: Set(event_type.to_string()),
        processed_at: Set(chrono::Utc::now().naive_utc()),
    };

    new_event.insert(db).await?;
    Ok(())
}

async fn handle_payment_event<C: ConnectionTrait>(
    db: &C,
    event: &PaymentEvent,
) -> Result<(), ApiError> {
    let Some(outcome) = event.outcome else {
        tracing::debug!(event_type = %event.event_type, "Unhandled event type");
        return Ok(());
    };

    let Some(order_id) = event.order_id.as_deref() else {
        tracing::warn!(event_type = %event.event_type, "Payment event without order id");
        return Ok(());
    };

    let settlement = settle_order(
        db,
        order_id,
        outcome,
        event.payment_id.clone(),
        chrono::Utc::now().naive_utc(),
    )
    .await?;

    match settlement {
        Settlement::Settled(_) => {}
        Settlement::Stale(record, err) => {
            tracing::warn!(
                order_id,
                subscription_id = %record.id,
                event_type = %event.event_type,
                error = %err,
                "Ignoring stale payment event"
            );
        }
        Settlement::UnknownOrder => {
            tracing::warn!(order_id, "No subscription found for gateway order");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::signature::sign;
    use crate::testing::{
        json_request, mock_db, send, state, state_log, statement_log, subscription_row,
    };
    use axum::http::HeaderValue;
    use eduhub::model::PaymentStatus;

    const FAILED_EVENT: &str = r#"{"event":"payment.failed","payload":{"payment":{"entity":{"id":"pay_2","order_id":"order_1"}}}}"#;

    fn signed_webhook(body: &str, event_id: &str) -> axum::http::Request<axum::body::Body> {
        let mut request = json_request("POST", "/api/v1/webhook/payment", None, body);
        let signature = sign(crate::testing::WEBHOOK_SECRET, body.as_bytes()).unwrap();
        let headers = request.headers_mut();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&signature).unwrap());
        headers.insert(EVENT_ID_HEADER, HeaderValue::from_str(event_id).unwrap());
        request
    }

    fn processed(event_id: &str) -> gateway_event::Model {
        gateway_event::Model {
            id: event_id.into(),
            event_type: "payment.failed".into(),
            processed_at: crate::testing::at(10),
        }
    }

    #[tokio::test]
    async fn test_failure_after_payment_is_acknowledged() {
        let db = mock_db()
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Paid)]])
            .into_connection();
        let event = parse_event(FAILED_EVENT.as_bytes()).unwrap();

        handle_payment_event(&db, &event).await.unwrap();

        let log = statement_log(db);
        assert_eq!(log.len(), 1);
        assert!(!log[0].contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_stale_event_is_recorded_and_answered_ok() {
        let db = mock_db()
            .append_query_results([Vec::<gateway_event::Model>::new()])
            .append_query_results([vec![subscription_row("u1", "order_1", PaymentStatus::Paid)]])
            .append_query_results([vec![processed("evt_late")]])
            .into_connection();
        let state = state(db);

        let response = send(&state, signed_webhook(FAILED_EVENT, "evt_late")).await;
        assert_eq!(response.status(), StatusCode::OK);

        drop(response);
        let log = state_log(state);
        assert_eq!(log.len(), 2);
        assert!(!log[1].contains("UPDATE"));
        assert!(log[1].contains("INSERT"));
        assert!(log[1].contains("GatewayEvent"));
    }

    #[tokio::test]
    async fn test_duplicate_event_is_not_reprocessed() {
        let db = mock_db()
            .append_query_results([vec![processed("evt_1")]])
            .into_connection();
        let state = state(db);

        let response = send(&state, signed_webhook(FAILED_EVENT, "evt_1")).await;
        assert_eq!(response.status(), StatusCode::OK);

        drop(response);
        let log = state_log(state);
        assert_eq!(log.len(), 1);
        assert!(log[0].contains("GatewayEvent"));
        assert!(!log[0].contains("Subscription"));
    }

    #[tokio::test]
    async fn test_bad_signature_touches_nothing() {
        let state = state(mock_db().into_connection());
        let mut request = signed_webhook(FAILED_EVENT, "evt_2");
        request
            .headers_mut()
            .insert(SIGNATURE_HEADER, HeaderValue::from_static("deadbeef"));

        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        drop(response);
        assert!(state_log(state).is_empty());
    }

    #[test]
    fn test_event_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_ID_HEADER, HeaderValue::from_static("evt_123"));
        assert_eq!(event_id(&headers, b"{}"), "evt_123");
    }

    #[test]
    fn test_event_id_falls_back_to_body_hash() {
        let headers = HeaderMap::new();
        let a = event_id(&headers, b"{\"event\":\"order.paid\"}");
        let b = event_id(&headers, b"{\"event\":\"order.paid\"}");
        let c = event_id(&headers, b"{\"event\":\"payment.failed\"}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
