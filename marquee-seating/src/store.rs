use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::StoreError;
use uuid::Uuid;

use crate::models::{Seat, SeatChange};

/// Seat persistence. Implementations must make `apply` all-or-nothing and
/// reject the batch with `StoreError::VersionConflict` when any seat's
/// version no longer matches — that check is what keeps two concurrent
/// reservations from both succeeding on the same seat.
#[async_trait]
pub trait SeatStore: Send + Sync {
    async fn list(&self, showtime_id: &str) -> Result<Vec<Seat>, StoreError>;

    /// Fetch a batch by id. Missing ids are simply absent from the result.
    async fn get_batch(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<Vec<Seat>, StoreError>;

    async fn insert_batch(&self, seats: Vec<Seat>) -> Result<(), StoreError>;

    async fn count(&self, showtime_id: &str) -> Result<u64, StoreError>;

    /// Atomically apply a batch of versioned changes.
    async fn apply(&self, showtime_id: &str, changes: &[SeatChange]) -> Result<(), StoreError>;

    /// Clear hold fields on every seat whose hold has expired, persisting the
    /// change. Returns how many seats were swept.
    async fn clear_expired_holds(&self, showtime_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Delete every seat of a showtime (re-initialization path).
    async fn wipe_showtime(&self, showtime_id: &str) -> Result<u64, StoreError>;
}
