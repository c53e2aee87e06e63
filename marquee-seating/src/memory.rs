use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::StoreError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Seat, SeatChange};
use crate::store::SeatStore;

/// In-memory seat store. Batches are applied under one write lock, and every
/// change carries the version observed at validation time, so a batch that
/// lost the race to a concurrent writer fails as a unit.
#[derive(Default)]
pub struct MemorySeatStore {
    inner: RwLock<HashMap<String, BTreeMap<Uuid, Seat>>>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn list(&self, showtime_id: &str) -> Result<Vec<Seat>, StoreError> {
        let map = self.inner.read().await;
        let mut seats: Vec<Seat> = map
            .get(showtime_id)
            .map(|seats| seats.values().cloned().collect())
            .unwrap_or_default();
        seats.sort_by(|a, b| (&a.row, a.number).cmp(&(&b.row, b.number)));
        Ok(seats)
    }

    async fn get_batch(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<Vec<Seat>, StoreError> {
        let map = self.inner.read().await;
        let Some(seats) = map.get(showtime_id) else {
            return Ok(Vec::new());
        };
        Ok(seat_ids.iter().filter_map(|id| seats.get(id).cloned()).collect())
    }

    async fn insert_batch(&self, new_seats: Vec<Seat>) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        for seat in new_seats {
            let seats = map.entry(seat.showtime_id.clone()).or_default();
            if seats.contains_key(&seat.id) {
                return Err(StoreError::Duplicate(format!("seat {}", seat.id)));
            }
            seats.insert(seat.id, seat);
        }
        Ok(())
    }

    async fn count(&self, showtime_id: &str) -> Result<u64, StoreError> {
        let map = self.inner.read().await;
        Ok(map.get(showtime_id).map(|seats| seats.len() as u64).unwrap_or(0))
    }

    async fn apply(&self, showtime_id: &str, changes: &[SeatChange]) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        let seats = map
            .get_mut(showtime_id)
            .ok_or_else(|| StoreError::NotFound(format!("showtime {showtime_id}")))?;

        // Validate the whole batch before touching anything.
        for change in changes {
            let seat = seats
                .get(&change.seat_id)
                .ok_or_else(|| StoreError::NotFound(format!("seat {}", change.seat_id)))?;
            if seat.version != change.expected_version {
                return Err(StoreError::VersionConflict { seat_id: change.seat_id });
            }
        }

        for change in changes {
            if let Some(seat) = seats.get_mut(&change.seat_id) {
                change.apply_to(seat);
            }
        }
        Ok(())
    }

    async fn clear_expired_holds(&self, showtime_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut map = self.inner.write().await;
        let Some(seats) = map.get_mut(showtime_id) else {
            return Ok(0);
        };
        let mut swept = 0;
        for seat in seats.values_mut() {
            if seat.hold_expired(now) {
                seat.held = false;
                seat.hold_expiry = None;
                seat.holder_session_id = None;
                seat.version += 1;
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn wipe_showtime(&self, showtime_id: &str) -> Result<u64, StoreError> {
        let mut map = self.inner.write().await;
        Ok(map.remove(showtime_id).map(|seats| seats.len() as u64).unwrap_or(0))
    }
}
