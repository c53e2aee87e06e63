use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::StoreError;
use uuid::Uuid;

use crate::models::{Booking, BookingStats, BookingStatus};

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn update(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Newest first.
    async fn by_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError>;

    async fn all(&self) -> Result<Vec<Booking>, StoreError>;

    async fn by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, StoreError>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<BookingStats, StoreError>;
}
