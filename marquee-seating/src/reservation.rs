use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use marquee_core::StoreError;
use uuid::Uuid;

use crate::models::{Seat, SeatChange};
use crate::store::SeatStore;

/// Idempotent clears (release/uncommit) re-read and retry this many times
/// when they lose a version race, e.g. against a concurrent expiry sweep.
const CLEAR_RETRY_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("seat not found: {0}")]
    SeatNotFound(String),

    #[error("seat {0} is no longer available")]
    SeatUnavailable(String),

    #[error(transparent)]
    Store(StoreError),
}

/// The only component allowed to flip `held`/`booked` on seats. Every batch
/// is validated in sorted seat-id order against a snapshot, then written
/// compare-and-swap; a lost race fails the whole batch with the conflicting
/// seat named, and no seat in the batch is mutated.
pub struct ReservationManager {
    store: Arc<dyn SeatStore>,
    hold_duration: Duration,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn SeatStore>, hold_minutes: i64) -> Self {
        Self { store, hold_duration: Duration::minutes(hold_minutes) }
    }

    /// Place or refresh holds on a batch of seats. A live hold is re-holdable
    /// (refreshing expiry and session); only a booked seat blocks the batch.
    pub async fn hold(&self, showtime_id: &str, seat_ids: &[Uuid], session_id: &str) -> Result<(), ReservationError> {
        let ids = sorted_unique(seat_ids);
        if ids.is_empty() {
            return Ok(());
        }

        let seats = self.load_required(showtime_id, &ids).await?;
        for seat in &seats {
            if seat.booked {
                return Err(ReservationError::SeatUnavailable(seat.label()));
            }
        }

        let expiry = Utc::now() + self.hold_duration;
        let changes: Vec<SeatChange> =
            seats.iter().map(|s| SeatChange::hold(s, session_id, expiry)).collect();
        self.apply(showtime_id, &changes, &seats).await
    }

    /// Clear holds. Seats already booked or already free are silently
    /// ignored.
    pub async fn release(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<(), ReservationError> {
        self.clear_matching(showtime_id, seat_ids, |seat| seat.held && !seat.booked).await
    }

    /// Transition seats to booked. Fails on the first already-booked seat in
    /// sorted order; an expired hold does not block. Returns the committed
    /// seat rows.
    pub async fn commit(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<Vec<Seat>, ReservationError> {
        let ids = sorted_unique(seat_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let seats = self.load_required(showtime_id, &ids).await?;
        for seat in &seats {
            if seat.booked {
                return Err(ReservationError::SeatUnavailable(seat.label()));
            }
        }

        let changes: Vec<SeatChange> = seats.iter().map(SeatChange::book).collect();
        self.apply(showtime_id, &changes, &seats).await?;
        self.store.get_batch(showtime_id, &ids).await.map_err(ReservationError::Store)
    }

    /// Reverse of commit, used by cancellation. Idempotent.
    pub async fn uncommit(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<(), ReservationError> {
        self.clear_matching(showtime_id, seat_ids, |seat| seat.booked || seat.held).await
    }

    /// Atomic seat swap for post-booking reseating. Old seats are left
    /// untouched if any incoming seat is unavailable. Returns the committed
    /// incoming seat rows.
    pub async fn reassign(
        &self,
        showtime_id: &str,
        old_seat_ids: &[Uuid],
        new_seat_ids: &[Uuid],
    ) -> Result<Vec<Seat>, ReservationError> {
        let old_ids = sorted_unique(old_seat_ids);
        let new_ids = sorted_unique(new_seat_ids);
        let mut all_ids = old_ids.clone();
        all_ids.extend(new_ids.iter().copied());
        let all_ids = sorted_unique(&all_ids);

        let found: HashMap<Uuid, Seat> = self
            .store
            .get_batch(showtime_id, &all_ids)
            .await
            .map_err(ReservationError::Store)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let old_set: HashSet<Uuid> = old_ids.iter().copied().collect();
        let new_set: HashSet<Uuid> = new_ids.iter().copied().collect();

        for id in &new_ids {
            let seat = found
                .get(id)
                .ok_or_else(|| ReservationError::SeatNotFound(id.to_string()))?;
            if seat.booked && !old_set.contains(id) {
                return Err(ReservationError::SeatUnavailable(seat.label()));
            }
        }

        let mut changes = Vec::new();
        for id in &old_ids {
            if new_set.contains(id) {
                continue;
            }
            if let Some(seat) = found.get(id) {
                if seat.booked || seat.held {
                    changes.push(SeatChange::free(seat));
                }
            }
        }
        for id in &new_ids {
            let seat = &found[id];
            if !seat.booked {
                changes.push(SeatChange::book(seat));
            }
        }

        let snapshot: Vec<Seat> = found.values().cloned().collect();
        self.apply(showtime_id, &changes, &snapshot).await?;
        self.store.get_batch(showtime_id, &new_ids).await.map_err(ReservationError::Store)
    }

    /// Load a batch, requiring every id to exist; ids are checked in sorted
    /// order so the same input always names the same missing seat.
    async fn load_required(&self, showtime_id: &str, ids: &[Uuid]) -> Result<Vec<Seat>, ReservationError> {
        let found: HashMap<Uuid, Seat> = self
            .store
            .get_batch(showtime_id, ids)
            .await
            .map_err(ReservationError::Store)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ReservationError::SeatNotFound(id.to_string()))
            })
            .collect()
    }

    async fn apply(
        &self,
        showtime_id: &str,
        changes: &[SeatChange],
        snapshot: &[Seat],
    ) -> Result<(), ReservationError> {
        match self.store.apply(showtime_id, changes).await {
            Ok(()) => Ok(()),
            Err(StoreError::VersionConflict { seat_id }) => {
                let label = snapshot
                    .iter()
                    .find(|s| s.id == seat_id)
                    .map(|s| s.label())
                    .unwrap_or_else(|| seat_id.to_string());
                Err(ReservationError::SeatUnavailable(label))
            }
            Err(e) => Err(ReservationError::Store(e)),
        }
    }

    async fn clear_matching(
        &self,
        showtime_id: &str,
        seat_ids: &[Uuid],
        matches: impl Fn(&Seat) -> bool,
    ) -> Result<(), ReservationError> {
        let ids = sorted_unique(seat_ids);
        if ids.is_empty() {
            return Ok(());
        }

        for _ in 0..CLEAR_RETRY_ATTEMPTS {
            let seats = self
                .store
                .get_batch(showtime_id, &ids)
                .await
                .map_err(ReservationError::Store)?;
            let changes: Vec<SeatChange> = seats
                .iter()
                .filter(|seat| matches(seat))
                .map(SeatChange::free)
                .collect();
            if changes.is_empty() {
                return Ok(());
            }
            match self.store.apply(showtime_id, &changes).await {
                Ok(()) => return Ok(()),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(ReservationError::Store(e)),
            }
        }

        Err(ReservationError::Store(StoreError::Backend(
            "seat clear kept losing version races".into(),
        )))
    }
}

fn sorted_unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySeatStore;
    use crate::models::SeatCategory;
    use async_trait::async_trait;
    use chrono::DateTime;
    use tokio::sync::Barrier;

    async fn seeded(n: i32) -> (Arc<MemorySeatStore>, ReservationManager, Vec<Uuid>) {
        let store = Arc::new(MemorySeatStore::new());
        let mut seats = Vec::new();
        for number in 1..=n {
            seats.push(Seat::new("show-1", "A".into(), number, 100.0, SeatCategory::Regular));
        }
        let mut ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();
        store.insert_batch(seats).await.unwrap();
        ids.sort();
        let manager = ReservationManager::new(store.clone(), 10);
        (store, manager, ids)
    }

    async fn seat(store: &MemorySeatStore, id: Uuid) -> Seat {
        store.get_batch("show-1", &[id]).await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn hold_marks_the_whole_batch() {
        let (store, manager, ids) = seeded(3).await;

        manager.hold("show-1", &ids, "session-1").await.unwrap();

        for id in &ids {
            let s = seat(&store, *id).await;
            assert!(s.held);
            assert!(!s.booked);
            assert_eq!(s.holder_session_id.as_deref(), Some("session-1"));
            assert!(s.hold_expiry.unwrap() > Utc::now());
        }
    }

    #[tokio::test]
    async fn hold_on_booked_seat_fails_without_partial_mutation() {
        let (store, manager, ids) = seeded(2).await;
        manager.commit("show-1", &ids[1..2]).await.unwrap();

        let err = manager.hold("show-1", &ids, "session-1").await.unwrap_err();
        let booked_label = seat(&store, ids[1]).await.label();
        match err {
            ReservationError::SeatUnavailable(label) => assert_eq!(label, booked_label),
            other => panic!("expected SeatUnavailable, got {other:?}"),
        }
        assert!(!seat(&store, ids[0]).await.held);
    }

    #[tokio::test]
    async fn hold_on_missing_seat_fails_without_partial_mutation() {
        let (store, manager, ids) = seeded(1).await;
        let phantom = Uuid::new_v4();

        let err = manager
            .hold("show-1", &[ids[0], phantom], "session-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::SeatNotFound(_)));
        assert!(!seat(&store, ids[0]).await.held);
    }

    #[tokio::test]
    async fn rehold_refreshes_expiry_and_session() {
        let (store, manager, ids) = seeded(1).await;

        manager.hold("show-1", &ids, "session-1").await.unwrap();
        let first_expiry = seat(&store, ids[0]).await.hold_expiry.unwrap();

        manager.hold("show-1", &ids, "session-1").await.unwrap();
        let second = seat(&store, ids[0]).await;
        assert!(second.hold_expiry.unwrap() >= first_expiry);

        // A later hold by a different session takes the seat over.
        manager.hold("show-1", &ids, "session-2").await.unwrap();
        assert_eq!(seat(&store, ids[0]).await.holder_session_id.as_deref(), Some("session-2"));
    }

    #[tokio::test]
    async fn expired_hold_counts_as_available_without_a_sweep() {
        let (store, manager, _) = seeded(0).await;

        let mut stale = Seat::new("show-1", "A".into(), 1, 100.0, SeatCategory::Regular);
        stale.held = true;
        stale.hold_expiry = Some(Utc::now() - Duration::minutes(1));
        stale.holder_session_id = Some("ghost".into());
        let id = stale.id;
        store.insert_batch(vec![stale]).await.unwrap();

        // No list_seats call in between: hold and commit must decide on
        // expiry themselves.
        manager.hold("show-1", &[id], "session-1").await.unwrap();
        assert_eq!(seat(&store, id).await.holder_session_id.as_deref(), Some("session-1"));

        manager.commit("show-1", &[id]).await.unwrap();
        assert!(seat(&store, id).await.booked);
    }

    #[tokio::test]
    async fn commit_clears_hold_fields() {
        let (store, manager, ids) = seeded(2).await;

        manager.hold("show-1", &ids, "session-1").await.unwrap();
        let committed = manager.commit("show-1", &ids).await.unwrap();
        assert_eq!(committed.len(), 2);

        for id in &ids {
            let s = seat(&store, *id).await;
            assert!(s.booked);
            assert!(!s.held, "a seat must never be booked and held at once");
            assert!(s.hold_expiry.is_none());
            assert!(s.holder_session_id.is_none());
        }
    }

    #[tokio::test]
    async fn commit_on_booked_seat_fails_atomically() {
        let (store, manager, ids) = seeded(2).await;
        manager.commit("show-1", &ids[1..2]).await.unwrap();

        let err = manager.commit("show-1", &ids).await.unwrap_err();
        assert!(matches!(err, ReservationError::SeatUnavailable(_)));
        assert!(!seat(&store, ids[0]).await.booked);
    }

    #[tokio::test]
    async fn release_clears_holds_and_ignores_the_rest() {
        let (store, manager, ids) = seeded(3).await;

        manager.hold("show-1", &ids[..2], "session-1").await.unwrap();
        manager.commit("show-1", &ids[2..]).await.unwrap();

        manager.release("show-1", &ids).await.unwrap();
        assert!(!seat(&store, ids[0]).await.held);
        assert!(!seat(&store, ids[1]).await.held);
        assert!(seat(&store, ids[2]).await.booked, "release must not touch booked seats");

        // Releasing again (and releasing free seats) is a no-op.
        manager.release("show-1", &ids).await.unwrap();
    }

    #[tokio::test]
    async fn uncommit_reopens_seats() {
        let (store, manager, ids) = seeded(2).await;

        manager.commit("show-1", &ids).await.unwrap();
        manager.uncommit("show-1", &ids).await.unwrap();

        for id in &ids {
            let s = seat(&store, *id).await;
            assert!(!s.booked);
            assert!(!s.held);
        }
    }

    #[tokio::test]
    async fn reassign_swaps_seats() {
        let (store, manager, ids) = seeded(4).await;

        manager.commit("show-1", &ids[..2]).await.unwrap();
        let moved = manager.reassign("show-1", &ids[..2], &ids[2..]).await.unwrap();
        assert_eq!(moved.len(), 2);

        assert!(!seat(&store, ids[0]).await.booked);
        assert!(!seat(&store, ids[1]).await.booked);
        assert!(seat(&store, ids[2]).await.booked);
        assert!(seat(&store, ids[3]).await.booked);
    }

    #[tokio::test]
    async fn reassign_keeps_overlapping_seats() {
        let (store, manager, ids) = seeded(3).await;

        manager.commit("show-1", &ids[..2]).await.unwrap();
        manager
            .reassign("show-1", &ids[..2], &[ids[1], ids[2]])
            .await
            .unwrap();

        assert!(!seat(&store, ids[0]).await.booked);
        assert!(seat(&store, ids[1]).await.booked);
        assert!(seat(&store, ids[2]).await.booked);
    }

    #[tokio::test]
    async fn reassign_conflict_leaves_old_seats_untouched() {
        let (store, manager, ids) = seeded(4).await;

        manager.commit("show-1", &ids[..2]).await.unwrap();
        // Someone else owns the target seat.
        manager.commit("show-1", &ids[2..3]).await.unwrap();

        let err = manager
            .reassign("show-1", &ids[..2], &ids[2..])
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::SeatUnavailable(_)));

        assert!(seat(&store, ids[0]).await.booked);
        assert!(seat(&store, ids[1]).await.booked);
        assert!(!seat(&store, ids[3]).await.booked);
    }

    /// Store wrapper that lets every racer finish its read before any write
    /// goes through, forcing all of them onto the same seat versions.
    struct RacingStore {
        inner: MemorySeatStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl SeatStore for RacingStore {
        async fn list(&self, showtime_id: &str) -> Result<Vec<Seat>, StoreError> {
            self.inner.list(showtime_id).await
        }

        async fn get_batch(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<Vec<Seat>, StoreError> {
            let seats = self.inner.get_batch(showtime_id, seat_ids).await?;
            self.barrier.wait().await;
            Ok(seats)
        }

        async fn insert_batch(&self, seats: Vec<Seat>) -> Result<(), StoreError> {
            self.inner.insert_batch(seats).await
        }

        async fn count(&self, showtime_id: &str) -> Result<u64, StoreError> {
            self.inner.count(showtime_id).await
        }

        async fn apply(&self, showtime_id: &str, changes: &[SeatChange]) -> Result<(), StoreError> {
            self.inner.apply(showtime_id, changes).await
        }

        async fn clear_expired_holds(
            &self,
            showtime_id: &str,
            now: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            self.inner.clear_expired_holds(showtime_id, now).await
        }

        async fn wipe_showtime(&self, showtime_id: &str) -> Result<u64, StoreError> {
            self.inner.wipe_showtime(showtime_id).await
        }
    }

    /// The read-then-write race the version counters exist for: every racer
    /// snapshots the seat before any of them writes, and exactly one may win.
    #[tokio::test]
    async fn concurrent_holds_on_one_seat_have_a_single_winner() {
        const RACERS: usize = 4;

        let inner = MemorySeatStore::new();
        let seat = Seat::new("show-1", "A".into(), 1, 100.0, SeatCategory::Regular);
        let seat_id = seat.id;
        inner.insert_batch(vec![seat]).await.unwrap();

        let store = Arc::new(RacingStore { inner, barrier: Barrier::new(RACERS) });
        let manager = Arc::new(ReservationManager::new(store, 10));

        let mut handles = Vec::new();
        for i in 0..RACERS {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.hold("show-1", &[seat_id], &format!("session-{i}")).await
            }));
        }

        let mut won = 0;
        let mut lost = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => won += 1,
                Err(ReservationError::SeatUnavailable(_)) => lost += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(lost, RACERS - 1);
    }
}
