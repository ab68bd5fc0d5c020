use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod attempts;
pub mod checkout;
pub mod subscriptions;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/subscriptions/checkout", post(checkout::checkout))
        .route("/subscriptions/callback", post(checkout::verify_payment))
        .route("/tests/{id}/attempts", post(attempts::start_attempt))
        .route("/attempts/{id}", get(attempts::get_attempt))
        .route("/attempts/{id}/submit", post(attempts::submit_attempt))
}
