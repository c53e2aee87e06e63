use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use marquee_core::{GatewayError, GatewayOrder, PaymentGateway};
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay signs callbacks with HMAC-SHA256 over `"{order_id}|{payment_id}"`.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time signature check. Undecodable input is simply a mismatch.
pub fn signature_matches(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    match hex::decode(signature) {
        Ok(bytes) => mac.verify_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Live gateway adapter. Orders are created over the provider's REST API with
/// basic auth; signature verification is local crypto and never leaves the
/// process.
pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    base_url: String,
    http: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(key_id: &str, key_secret: &str) -> Self {
        Self::with_base_url(key_id, key_secret, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(key_id: &str, key_secret: &str, base_url: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount: f64, currency: &str) -> Result<GatewayOrder, GatewayError> {
        let amount_minor = (amount * 100.0).round() as i64;
        let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
        debug!(amount_minor, currency, receipt, "creating gateway order");

        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "order create returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let order_id = body["id"]
            .as_str()
            .ok_or_else(|| GatewayError::Provider("order response missing id".into()))?
            .to_string();

        info!(order_id, amount_minor, "gateway order created");
        Ok(GatewayOrder {
            order_id,
            amount_minor,
            currency: currency.to_string(),
            key_id: self.key_id.clone(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature_matches(&self.key_secret, order_id, payment_id, signature)
    }
}

/// In-process gateway sharing the live adapter's signing scheme, so tests can
/// mint valid signatures. A negative amount simulates provider rejection.
pub struct MockGateway {
    secret: String,
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new(secret: &str) -> Self {
        Self { secret: secret.to_string(), counter: AtomicU64::new(0) }
    }

    /// A signature the adapter will accept, for driving the happy path.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        payment_signature(&self.secret, order_id, payment_id)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, amount: f64, currency: &str) -> Result<GatewayOrder, GatewayError> {
        if amount < 0.0 {
            return Err(GatewayError::Provider("amount must be positive".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(GatewayOrder {
            order_id: format!("order_MOCK{n:06}"),
            amount_minor: (amount * 100.0).round() as i64,
            currency: currency.to_string(),
            key_id: "rzp_test_mock".to_string(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature_matches(&self.secret, order_id, payment_id, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let sig = payment_signature("secret", "order_1", "pay_1");
        assert!(signature_matches("secret", "order_1", "pay_1", &sig));
    }

    #[test]
    fn mismatched_signature_is_false_not_an_error() {
        let sig = payment_signature("secret", "order_1", "pay_1");
        assert!(!signature_matches("other-secret", "order_1", "pay_1", &sig));
        assert!(!signature_matches("secret", "order_2", "pay_1", &sig));
        assert!(!signature_matches("secret", "order_1", "pay_1", "not-even-hex!"));
        assert!(!signature_matches("secret", "order_1", "pay_1", ""));
    }

    #[tokio::test]
    async fn mock_gateway_mints_verifiable_orders() {
        let gateway = MockGateway::new("secret");
        let order = gateway.create_order(450.0, "INR").await.unwrap();
        assert_eq!(order.amount_minor, 45000);

        let sig = gateway.sign(&order.order_id, "pay_42");
        assert!(gateway.verify_signature(&order.order_id, "pay_42", &sig));
        assert!(!gateway.verify_signature(&order.order_id, "pay_43", &sig));
    }

    #[tokio::test]
    async fn mock_gateway_rejects_negative_amounts() {
        let gateway = MockGateway::new("secret");
        let err = gateway.create_order(-1.0, "INR").await.unwrap_err();
        assert!(matches!(err, GatewayError::Provider(_)));
    }
}
