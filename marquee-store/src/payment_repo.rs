use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marquee_core::StoreError;
use marquee_payment::{
    Payment, PaymentMethod, PaymentStats, PaymentStatus, PaymentStore, ReconciliationReason,
    ReconciliationRecord, ReconciliationStore,
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: String,
    amount: f64,
    method: String,
    status: String,
    transaction_id: Option<String>,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    gateway_signature: Option<String>,
    payment_date: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Payment {
        Payment {
            id: self.id,
            booking_id: self.booking_id,
            amount: self.amount,
            method: method_from_str(&self.method),
            status: payment_status_from_str(&self.status),
            transaction_id: self.transaction_id,
            gateway_order_id: self.gateway_order_id,
            gateway_payment_id: self.gateway_payment_id,
            gateway_signature: self.gateway_signature,
            payment_date: self.payment_date,
        }
    }
}

fn method_to_str(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Card => "CARD",
        PaymentMethod::Upi => "UPI",
        PaymentMethod::Wallet => "WALLET",
    }
}

fn method_from_str(method: &str) -> PaymentMethod {
    match method {
        "CARD" => PaymentMethod::Card,
        "WALLET" => PaymentMethod::Wallet,
        _ => PaymentMethod::Upi,
    }
}

fn payment_status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "PENDING",
        PaymentStatus::Success => "SUCCESS",
        PaymentStatus::Failed => "FAILED",
        PaymentStatus::Refunded => "REFUNDED",
    }
}

fn payment_status_from_str(status: &str) -> PaymentStatus {
    match status {
        "SUCCESS" => PaymentStatus::Success,
        "FAILED" => PaymentStatus::Failed,
        "REFUNDED" => PaymentStatus::Refunded,
        _ => PaymentStatus::Pending,
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

const SELECT_PAYMENT: &str = "SELECT id, booking_id, amount, method, status, transaction_id, \
     gateway_order_id, gateway_payment_id, gateway_signature, payment_date FROM payments";

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO payments (id, booking_id, amount, method, status, transaction_id, \
             gateway_order_id, gateway_payment_id, gateway_signature, payment_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(payment.id)
        .bind(&payment.booking_id)
        .bind(payment.amount)
        .bind(method_to_str(payment.method))
        .bind(payment_status_to_str(payment.status))
        .bind(&payment.transaction_id)
        .bind(&payment.gateway_order_id)
        .bind(&payment.gateway_payment_id)
        .bind(&payment.gateway_signature)
        .bind(payment.payment_date)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("payment for booking {}", payment.booking_id))
            }
            _ => backend(e),
        })?;
        Ok(())
    }

    async fn by_booking(&self, booking_id: &str) -> Result<Option<Payment>, StoreError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{SELECT_PAYMENT} WHERE booking_id = $1"))
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(PaymentRow::into_payment))
    }

    async fn by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>, StoreError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{SELECT_PAYMENT} WHERE transaction_id = $1"))
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(PaymentRow::into_payment))
    }

    async fn mark_refunded(&self, booking_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'REFUNDED' WHERE booking_id = $1 AND status = 'SUCCESS'",
        )
        .bind(booking_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<PaymentStats, StoreError> {
        let (revenue, successful, failed, last_7, last_30): (
            Option<f64>,
            i64,
            i64,
            Option<f64>,
            Option<f64>,
        ) = sqlx::query_as(
            "SELECT SUM(amount) FILTER (WHERE status IN ('SUCCESS', 'REFUNDED')), \
             COUNT(*) FILTER (WHERE status IN ('SUCCESS', 'REFUNDED')), \
             COUNT(*) FILTER (WHERE status = 'FAILED'), \
             SUM(amount) FILTER (WHERE status IN ('SUCCESS', 'REFUNDED') AND payment_date >= $1), \
             SUM(amount) FILTER (WHERE status IN ('SUCCESS', 'REFUNDED') AND payment_date >= $2) \
             FROM payments",
        )
        .bind(now - Duration::days(7))
        .bind(now - Duration::days(30))
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(PaymentStats {
            total_revenue: revenue.unwrap_or(0.0),
            successful_payments: successful as u64,
            failed_payments: failed as u64,
            revenue_last_7_days: last_7.unwrap_or(0.0),
            revenue_last_30_days: last_30.unwrap_or(0.0),
        })
    }
}

pub struct PgReconciliationStore {
    pool: PgPool,
}

impl PgReconciliationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReconciliationRow {
    id: Uuid,
    gateway_order_id: String,
    gateway_payment_id: String,
    user_id: String,
    showtime_id: String,
    amount: f64,
    reason: String,
    detail: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl ReconciliationRow {
    fn into_record(self) -> ReconciliationRecord {
        ReconciliationRecord {
            id: self.id,
            gateway_order_id: self.gateway_order_id,
            gateway_payment_id: self.gateway_payment_id,
            user_id: self.user_id,
            showtime_id: self.showtime_id,
            amount: self.amount,
            reason: if self.reason == "SHOWTIME_UNAVAILABLE" {
                ReconciliationReason::ShowtimeUnavailable
            } else {
                ReconciliationReason::BookingFailed
            },
            detail: self.detail,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        }
    }
}

fn reason_to_str(reason: ReconciliationReason) -> &'static str {
    match reason {
        ReconciliationReason::ShowtimeUnavailable => "SHOWTIME_UNAVAILABLE",
        ReconciliationReason::BookingFailed => "BOOKING_FAILED",
    }
}

#[async_trait]
impl ReconciliationStore for PgReconciliationStore {
    async fn insert(&self, record: &ReconciliationRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reconciliation_records (id, gateway_order_id, gateway_payment_id, \
             user_id, showtime_id, amount, reason, detail, created_at, resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(record.id)
        .bind(&record.gateway_order_id)
        .bind(&record.gateway_payment_id)
        .bind(&record.user_id)
        .bind(&record.showtime_id)
        .bind(record.amount)
        .bind(reason_to_str(record.reason))
        .bind(&record.detail)
        .bind(record.created_at)
        .bind(record.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn open(&self) -> Result<Vec<ReconciliationRecord>, StoreError> {
        let rows: Vec<ReconciliationRow> = sqlx::query_as(
            "SELECT id, gateway_order_id, gateway_payment_id, user_id, showtime_id, amount, \
             reason, detail, created_at, resolved_at FROM reconciliation_records \
             WHERE resolved_at IS NULL ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(ReconciliationRow::into_record).collect())
    }

    async fn resolve(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE reconciliation_records SET resolved_at = $1 \
             WHERE id = $2 AND resolved_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
