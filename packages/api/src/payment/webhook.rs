//! Gateway webhook payloads.

use serde::Deserialize;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";
pub const EVENT_ID_HEADER: &str = "x-razorpay-event-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

/// The part of a webhook event that drives subscription status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_type: String,
    /// `None` for events we acknowledge and ignore
    pub outcome: Option<PaymentOutcome>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Deserialize, Default)]
struct Payload {
    payment: Option<Wrapped<PaymentEntity>>,
    order: Option<Wrapped<OrderEntity>>,
}

#[derive(Deserialize)]
struct Wrapped<T> {
    entity: T,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: String,
    #[serde(default)]
    order_id: Option<String>,
}

#[derive(Deserialize)]
struct OrderEntity {
    id: String,
}

pub fn parse_event(body: &[u8]) -> Result<PaymentEvent, serde_json::Error> {
    let envelope: Envelope = serde_json::from_slice(body)?;

    let outcome = match envelope.event.as_str() {
        "payment.captured" | "order.paid" => Some(PaymentOutcome::Paid),
        "payment.failed" => Some(PaymentOutcome::Failed),
        _ => None,
    };

    let payment = envelope.payload.payment.map(|p| p.entity);
    let order_id = envelope
        .payload
        .order
        .map(|o| o.entity.id)
        .or_else(|| payment.as_ref().and_then(|p| p.order_id.clone()));

    Ok(PaymentEvent {
        event_type: envelope.event,
        outcome,
        order_id,
        payment_id: payment.map(|p| p.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_captured() {
        let body = br#"{
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {"entity": {"id": "pay_1", "order_id": "order_1", "status": "captured"}}
            }
        }"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.outcome, Some(PaymentOutcome::Paid));
        assert_eq!(event.order_id.as_deref(), Some("order_1"));
        assert_eq!(event.payment_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn test_order_paid_prefers_order_entity() {
        let body = br#"{
            "event": "order.paid",
            "payload": {
                "payment": {"entity": {"id": "pay_2"}},
                "order": {"entity": {"id": "order_2", "status": "paid"}}
            }
        }"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.outcome, Some(PaymentOutcome::Paid));
        assert_eq!(event.order_id.as_deref(), Some("order_2"));
    }

    #[test]
    fn test_failed_and_ignored_events() {
        let failed = br#"{"event":"payment.failed","payload":{"payment":{"entity":{"id":"pay_3","order_id":"order_3"}}}}"#;
        assert_eq!(
            parse_event(failed).unwrap().outcome,
            Some(PaymentOutcome::Failed)
        );

        let refund = br#"{"event":"refund.created","payload":{}}"#;
        let event = parse_event(refund).unwrap();
        assert_eq!(event.outcome, None);
        assert_eq!(event.order_id, None);

        assert!(parse_event(b"not json").is_err());
    }
}
