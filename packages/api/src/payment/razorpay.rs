use async_trait::async_trait;
use serde::Deserialize;

use super::{GatewayOrder, OrderRequest, PaymentConfig, PaymentGateway, signature};
use crate::error::ApiError;

pub struct RazorpayGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl RazorpayGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Deserialize)]
struct GatewayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<GatewayOrder, ApiError> {
        let response = self
            .client
            .post(self.url("orders"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(order)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<GatewayErrorBody>().await {
                Ok(body) => format!(
                    "{}: {}",
                    body.error.code.unwrap_or_default(),
                    body.error.description.unwrap_or_default()
                ),
                Err(_) => String::from("unreadable error body"),
            };
            return Err(ApiError::bad_gateway(format!(
                "order creation failed with {status}: {detail}"
            )));
        }

        let created: GatewayOrder = response.json().await?;
        tracing::info!(
            order_id = %created.id,
            receipt = %order.receipt,
            amount = created.amount,
            "Gateway order created"
        );
        Ok(created)
    }

    fn verify_payment(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let payload = signature::payment_payload(order_id, payment_id);
        signature::verify(&self.config.key_secret, payload.as_bytes(), signature)
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        signature::verify(&self.config.webhook_secret, body, signature)
    }
}
