use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::StoreError;
use uuid::Uuid;

use crate::models::{Payment, PaymentStats, ReconciliationRecord};

/// Payment rows. Implementations enforce the unique booking-id and
/// transaction-id constraints with `StoreError::Duplicate`.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError>;

    async fn by_booking(&self, booking_id: &str) -> Result<Option<Payment>, StoreError>;

    async fn by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>, StoreError>;

    /// SUCCESS → REFUNDED bookkeeping on cancellation. Returns whether a row
    /// was updated.
    async fn mark_refunded(&self, booking_id: &str) -> Result<bool, StoreError>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<PaymentStats, StoreError>;
}

#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    async fn insert(&self, record: &ReconciliationRecord) -> Result<(), StoreError>;

    /// Unresolved records, oldest first.
    async fn open(&self) -> Result<Vec<ReconciliationRecord>, StoreError>;

    async fn resolve(&self, id: Uuid) -> Result<bool, StoreError>;
}
