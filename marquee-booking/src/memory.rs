use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marquee_core::StoreError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Booking, BookingStats, BookingStatus};
use crate::store::BookingStore;

#[derive(Default)]
pub struct MemoryBookingStore {
    inner: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        if map.contains_key(&booking.id) {
            return Err(StoreError::Duplicate(format!("booking {}", booking.id)));
        }
        map.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn update(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        if !map.contains_key(&booking.id) {
            return Err(StoreError::NotFound(format!("booking {}", booking.id)));
        }
        map.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        map.remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("booking {id}")))
    }

    async fn by_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError> {
        let map = self.inner.read().await;
        let mut bookings: Vec<Booking> =
            map.values().filter(|b| b.user_id == user_id).cloned().collect();
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn all(&self) -> Result<Vec<Booking>, StoreError> {
        let map = self.inner.read().await;
        let mut bookings: Vec<Booking> = map.values().cloned().collect();
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, StoreError> {
        let map = self.inner.read().await;
        let mut bookings: Vec<Booking> =
            map.values().filter(|b| b.status == status).cloned().collect();
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<BookingStats, StoreError> {
        let map = self.inner.read().await;
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let mut stats = BookingStats {
            total_bookings: 0,
            cancelled_bookings: 0,
            bookings_last_7_days: 0,
            bookings_last_30_days: 0,
            total_seats_booked: 0,
        };
        for booking in map.values() {
            stats.total_bookings += 1;
            if booking.status == BookingStatus::Cancelled {
                stats.cancelled_bookings += 1;
            }
            if booking.booking_date >= week_ago {
                stats.bookings_last_7_days += 1;
            }
            if booking.booking_date >= month_ago {
                stats.bookings_last_30_days += 1;
            }
            stats.total_seats_booked += booking.seats.len() as u64;
        }
        Ok(stats)
    }
}
