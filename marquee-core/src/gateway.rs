use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Order handle returned by the payment provider. `amount_minor` is the
/// amount in the gateway's minor unit (paise for INR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway rejected the request: {0}")]
    Provider(String),

    #[error("payment gateway unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order with the provider. Amount is in major units and is
    /// converted to the gateway's minor unit internally.
    async fn create_order(&self, amount: f64, currency: &str) -> Result<GatewayOrder, GatewayError>;

    /// Check the callback signature against the shared secret. A mismatched
    /// or undecodable signature returns false; this never errors.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
