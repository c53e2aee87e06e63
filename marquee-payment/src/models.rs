use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
}

/// One row per saga run, successful or failed. Immutable after creation
/// except for the SUCCESS → REFUNDED bookkeeping transition on cancellation.
/// `booking_id` is a string because failed attempts carry a synthetic id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// SUCCESS row for a persisted booking; the gateway payment id doubles
    /// as the transaction id.
    pub fn success(
        booking_id: Uuid,
        amount: f64,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking_id.to_string(),
            amount,
            method: PaymentMethod::Upi,
            status: PaymentStatus::Success,
            transaction_id: Some(gateway_payment_id.to_string()),
            gateway_order_id: Some(gateway_order_id.to_string()),
            gateway_payment_id: Some(gateway_payment_id.to_string()),
            gateway_signature: Some(gateway_signature.to_string()),
            payment_date: Utc::now(),
        }
    }

    /// FAILED row tagged with the gateway order id so failed attempts stay
    /// auditable. The synthetic booking id keeps the uniqueness constraint
    /// collision-free.
    pub fn failed(amount: f64, gateway_order_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: format!("BKG_FAILED_{}", Uuid::new_v4().simple()),
            amount,
            method: PaymentMethod::Upi,
            status: PaymentStatus::Failed,
            transaction_id: None,
            gateway_order_id: Some(gateway_order_id.to_string()),
            gateway_payment_id: None,
            gateway_signature: None,
            payment_date: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStats {
    pub total_revenue: f64,
    pub successful_payments: u64,
    pub failed_payments: u64,
    pub revenue_last_7_days: f64,
    pub revenue_last_30_days: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationReason {
    ShowtimeUnavailable,
    BookingFailed,
}

/// Durable marker for a captured payment that produced no booking. An
/// operator process issues the gateway refund and resolves the record; the
/// saga itself never refunds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub user_id: String,
    pub showtime_id: String,
    pub amount: f64,
    pub reason: ReconciliationReason,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReconciliationRecord {
    pub fn new(
        user_id: &str,
        showtime_id: &str,
        amount: f64,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        reason: ReconciliationReason,
        detail: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: gateway_payment_id.to_string(),
            user_id: user_id.to_string(),
            showtime_id: showtime_id.to_string(),
            amount,
            reason,
            detail,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}
