use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use marquee_core::{ScreenLayout, ScreenLayoutLookup, SeatCategorySpec, StoreError};
use tracing::{debug, info};

use crate::models::{Seat, SeatCategory};
use crate::store::SeatStore;

const DEFAULT_SEAT_PRICE: f64 = 100.0;

#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("screen layout unavailable: {0}")]
    LayoutUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authoritative per-showtime seat state. Expired holds are swept lazily,
/// on the list path only; there is no background timer.
pub struct SeatLedger {
    store: Arc<dyn SeatStore>,
    layouts: Arc<dyn ScreenLayoutLookup>,
}

impl SeatLedger {
    pub fn new(store: Arc<dyn SeatStore>, layouts: Arc<dyn ScreenLayoutLookup>) -> Self {
        Self { store, layouts }
    }

    pub async fn list_seats(&self, showtime_id: &str) -> Result<Vec<Seat>, SeatError> {
        let swept = self.store.clear_expired_holds(showtime_id, Utc::now()).await?;
        if swept > 0 {
            debug!(showtime_id, swept, "released expired seat holds");
        }
        Ok(self.store.list(showtime_id).await?)
    }

    /// Create the seat map for a showtime from its screen's layout. No-op if
    /// the showtime already has seats. Returns the number of seats created.
    pub async fn initialize_seats(&self, showtime_id: &str, screen_id: &str) -> Result<u64, SeatError> {
        if self.store.count(showtime_id).await? > 0 {
            return Ok(0);
        }

        let layout = self
            .layouts
            .get_screen_layout(screen_id)
            .await
            .map_err(|e| SeatError::LayoutUnavailable(e.to_string()))?;

        let seats = seats_from_layout(showtime_id, &layout);
        let created = seats.len() as u64;
        self.store.insert_batch(seats).await?;
        info!(showtime_id, screen_id, created, "seat map initialized");
        Ok(created)
    }

    pub async fn wipe_showtime(&self, showtime_id: &str) -> Result<u64, SeatError> {
        let removed = self.store.wipe_showtime(showtime_id).await?;
        info!(showtime_id, removed, "seat map wiped");
        Ok(removed)
    }
}

fn seats_from_layout(showtime_id: &str, layout: &ScreenLayout) -> Vec<Seat> {
    let categories: HashMap<&str, &SeatCategorySpec> =
        layout.categories.iter().map(|c| (c.id.as_str(), c)).collect();

    layout
        .cells
        .iter()
        .filter(|cell| cell.is_enabled())
        .map(|cell| {
            let spec = categories.get(cell.category_id.as_str());
            Seat::new(
                showtime_id,
                row_label(cell.row),
                cell.col as i32 + 1,
                spec.map(|s| s.price).unwrap_or(DEFAULT_SEAT_PRICE),
                spec.map(|s| category_of(&s.name)).unwrap_or(SeatCategory::Regular),
            )
        })
        .collect()
}

fn row_label(row: u32) -> String {
    char::from(b'A' + (row % 26) as u8).to_string()
}

fn category_of(name: &str) -> SeatCategory {
    let name = name.to_ascii_lowercase();
    if name.contains("vip") {
        SeatCategory::Vip
    } else if name.contains("premium") {
        SeatCategory::Premium
    } else {
        SeatCategory::Regular
    }
}
