//! Fixtures for handler tests running against sea-orm's mock connection.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use chrono::NaiveDateTime;
use eduhub::model::{CourseTypeKind, EntityKind, PaymentStatus, PricingLevel, Tier};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::ServiceExt;

use crate::auth::{Role, issue_token};
use crate::entity::{course, course_type, json_columns::StringList, pricing_config, subscription};
use crate::payment::{DynGateway, PaymentConfig, RazorpayGateway};
use crate::state::{ApiConfig, State};

pub const JWT_SECRET: &str = "handler-secret";
pub const KEY_SECRET: &str = "key-secret";
pub const WEBHOOK_SECRET: &str = "webhook-secret";

pub fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

/// State with a configured gateway. The gateway is never called over the
/// network by the paths under test.
pub fn state(db: DatabaseConnection) -> Arc<State> {
    let payment = PaymentConfig {
        key_id: "rzp_test_key".into(),
        key_secret: KEY_SECRET.into(),
        webhook_secret: WEBHOOK_SECRET.into(),
        api_base: "http://127.0.0.1:9".into(),
    };
    let gateway = Arc::new(RazorpayGateway::new(payment.clone())) as DynGateway;
    let config = ApiConfig {
        jwt_secret: JWT_SECRET.into(),
        currency: "INR".into(),
        payment: Some(payment),
    };
    Arc::new(State::with_gateway(db, config, Some(gateway)))
}

pub fn bearer(user_id: &str, role: Role) -> String {
    let token = issue_token(JWT_SECRET, user_id, role, chrono::Duration::hours(1)).unwrap();
    format!("Bearer {token}")
}

pub fn json_request(method: &str, uri: &str, auth: Option<String>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(state: &Arc<State>, request: Request<Body>) -> Response {
    crate::construct_router(state.clone())
        .oneshot(request)
        .await
        .unwrap()
}

/// Every logged transaction rendered as text. Statements run outside a
/// transaction appear as their own entry.
pub fn statement_log(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .map(|txn| format!("{txn:?}"))
        .collect()
}

pub fn state_log(state: Arc<State>) -> Vec<String> {
    match Arc::try_unwrap(state) {
        Ok(state) => statement_log(state.db),
        Err(_) => panic!("state is still shared by a router"),
    }
}

pub fn at(hour: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn subscription_row(
    user_id: &str,
    order_id: &str,
    status: PaymentStatus,
) -> subscription::Model {
    let paid = status == PaymentStatus::Paid;
    subscription::Model {
        id: format!("sub_{order_id}"),
        user_id: user_id.into(),
        course_type_id: "ct_1".into(),
        entity_kind: EntityKind::Course,
        entity_id: "course_1".into(),
        tier: Tier::Monthly,
        amount: Decimal::new(49900, 2),
        currency: "INR".into(),
        status,
        gateway_order_id: Some(order_id.into()),
        gateway_payment_id: paid.then(|| "pay_1".to_string()),
        starts_at: paid.then(|| at(9)),
        ends_at: paid.then(|| at(9) + chrono::Duration::days(30)),
        created_at: at(8),
        updated_at: at(9),
    }
}

pub fn course_type_row(kind: CourseTypeKind) -> course_type::Model {
    course_type::Model {
        id: "ct_1".into(),
        name: kind.as_str().into(),
        kind,
        description: None,
        display_order: 0,
        is_active: true,
        created_at: at(8),
        updated_at: at(8),
    }
}

pub fn course_row() -> course::Model {
    course::Model {
        id: "course_1".into(),
        course_type_id: "ct_1".into(),
        name: "Systems Programming".into(),
        description: None,
        skills: StringList(vec![]),
        display_order: 0,
        is_active: true,
        created_at: at(8),
        updated_at: at(8),
    }
}

pub fn pricing_row(
    level: PricingLevel,
    entity_id: &str,
    base_price: Decimal,
) -> pricing_config::Model {
    pricing_config::Model {
        id: format!("price_{entity_id}"),
        course_type_id: "ct_1".into(),
        level,
        entity_id: entity_id.into(),
        tier: Tier::Monthly,
        base_price,
        discount_percent: 0,
        valid_from: None,
        valid_to: None,
        created_at: at(8),
        updated_at: at(8),
    }
}
