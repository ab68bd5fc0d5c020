//! Payment gateway integration.
//!
//! Each checkout is a one-off gateway order. The client completes payment
//! with the gateway and reports back through the signed callback; the gateway
//! also pushes signed webhook events. Both paths drive the subscription's
//! payment status.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub mod razorpay;
pub mod signature;
pub mod webhook;

pub use razorpay::RazorpayGateway;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    pub api_base: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderRequest {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    /// Our subscription id
    pub receipt: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

pub type DynGateway = Arc<dyn PaymentGateway>;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the client checkout widget.
    fn key_id(&self) -> &str;

    async fn create_order(&self, order: &OrderRequest) -> Result<GatewayOrder, ApiError>;

    /// Checks the client callback signature over `order_id|payment_id`.
    fn verify_payment(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Checks the webhook signature over the raw request body.
    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool;
}
