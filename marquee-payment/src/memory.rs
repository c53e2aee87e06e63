use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marquee_core::StoreError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Payment, PaymentStats, PaymentStatus, ReconciliationRecord};
use crate::store::{PaymentStore, ReconciliationStore};

#[derive(Default)]
pub struct MemoryPaymentStore {
    inner: RwLock<Vec<Payment>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Payment> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut rows = self.inner.write().await;
        if rows.iter().any(|p| p.booking_id == payment.booking_id) {
            return Err(StoreError::Duplicate(format!("payment for booking {}", payment.booking_id)));
        }
        if let Some(txn) = &payment.transaction_id {
            if rows.iter().any(|p| p.transaction_id.as_deref() == Some(txn)) {
                return Err(StoreError::Duplicate(format!("transaction {txn}")));
            }
        }
        rows.push(payment.clone());
        Ok(())
    }

    async fn by_booking(&self, booking_id: &str) -> Result<Option<Payment>, StoreError> {
        let rows = self.inner.read().await;
        Ok(rows.iter().find(|p| p.booking_id == booking_id).cloned())
    }

    async fn by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>, StoreError> {
        let rows = self.inner.read().await;
        Ok(rows
            .iter()
            .find(|p| p.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn mark_refunded(&self, booking_id: &str) -> Result<bool, StoreError> {
        let mut rows = self.inner.write().await;
        for payment in rows.iter_mut() {
            if payment.booking_id == booking_id && payment.status == PaymentStatus::Success {
                payment.status = PaymentStatus::Refunded;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<PaymentStats, StoreError> {
        let rows = self.inner.read().await;
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let mut stats = PaymentStats {
            total_revenue: 0.0,
            successful_payments: 0,
            failed_payments: 0,
            revenue_last_7_days: 0.0,
            revenue_last_30_days: 0.0,
        };
        for payment in rows.iter() {
            match payment.status {
                PaymentStatus::Success | PaymentStatus::Refunded => {
                    stats.successful_payments += 1;
                    stats.total_revenue += payment.amount;
                    if payment.payment_date >= week_ago {
                        stats.revenue_last_7_days += payment.amount;
                    }
                    if payment.payment_date >= month_ago {
                        stats.revenue_last_30_days += payment.amount;
                    }
                }
                PaymentStatus::Failed => stats.failed_payments += 1,
                PaymentStatus::Pending => {}
            }
        }
        Ok(stats)
    }
}

#[derive(Default)]
pub struct MemoryReconciliationStore {
    inner: RwLock<Vec<ReconciliationRecord>>,
}

impl MemoryReconciliationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReconciliationStore for MemoryReconciliationStore {
    async fn insert(&self, record: &ReconciliationRecord) -> Result<(), StoreError> {
        self.inner.write().await.push(record.clone());
        Ok(())
    }

    async fn open(&self) -> Result<Vec<ReconciliationRecord>, StoreError> {
        let rows = self.inner.read().await;
        let mut open: Vec<ReconciliationRecord> =
            rows.iter().filter(|r| r.resolved_at.is_none()).cloned().collect();
        open.sort_by_key(|r| r.created_at);
        Ok(open)
    }

    async fn resolve(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.inner.write().await;
        for record in rows.iter_mut() {
            if record.id == id && record.resolved_at.is_none() {
                record.resolved_at = Some(Utc::now());
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, ReconciliationReason};

    #[tokio::test]
    async fn payment_uniqueness_is_enforced() {
        let store = MemoryPaymentStore::new();
        let booking_id = Uuid::new_v4();
        let first = Payment::success(booking_id, 500.0, "order_1", "pay_1", "sig");
        store.insert(&first).await.unwrap();

        // Same booking, different transaction.
        let dup_booking = Payment::success(booking_id, 500.0, "order_2", "pay_2", "sig");
        assert!(matches!(
            store.insert(&dup_booking).await.unwrap_err(),
            StoreError::Duplicate(_)
        ));

        // Different booking, same transaction.
        let dup_txn = Payment::success(Uuid::new_v4(), 500.0, "order_3", "pay_1", "sig");
        assert!(matches!(store.insert(&dup_txn).await.unwrap_err(), StoreError::Duplicate(_)));

        let found = store.by_transaction("pay_1").await.unwrap().unwrap();
        assert_eq!(found.booking_id, booking_id.to_string());
        assert_eq!(found.method, PaymentMethod::Upi);
    }

    #[tokio::test]
    async fn resolving_a_record_removes_it_from_the_open_queue() {
        let store = MemoryReconciliationStore::new();
        let record = ReconciliationRecord::new(
            "user-1",
            "show-1",
            500.0,
            "order_1",
            "pay_1",
            ReconciliationReason::BookingFailed,
            "seat A1 is no longer available".into(),
        );
        store.insert(&record).await.unwrap();
        assert_eq!(store.open().await.unwrap().len(), 1);

        assert!(store.resolve(record.id).await.unwrap());
        assert!(store.open().await.unwrap().is_empty());

        // Resolving twice is a no-op.
        assert!(!store.resolve(record.id).await.unwrap());
    }
}
