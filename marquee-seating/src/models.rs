use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatCategory {
    Regular,
    Premium,
    Vip,
}

/// One physical seat for one showtime. A hold is not a separate entity; it is
/// the (`held`, `hold_expiry`, `holder_session_id`) triple on the seat itself.
/// Invariants: never `booked` and `held` at once; `hold_expiry` is set iff
/// `held`. The version counter backs compare-and-swap writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub showtime_id: String,
    pub row: String,
    pub number: i32,
    pub price: f64,
    pub category: SeatCategory,
    pub booked: bool,
    pub held: bool,
    pub hold_expiry: Option<DateTime<Utc>>,
    pub holder_session_id: Option<String>,
    pub disabled: bool,
    pub version: i64,
}

impl Seat {
    pub fn new(showtime_id: &str, row: String, number: i32, price: f64, category: SeatCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            showtime_id: showtime_id.to_string(),
            row,
            number,
            price,
            category,
            booked: false,
            held: false,
            hold_expiry: None,
            holder_session_id: None,
            disabled: false,
            version: 0,
        }
    }

    /// Display label, e.g. "A5".
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.number)
    }

    pub fn hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.held && self.hold_expiry.map(|expiry| expiry < now).unwrap_or(true)
    }
}

/// A single-seat mutation inside an atomic batch. `expected_version` is the
/// version observed during validation; the store rejects the whole batch if
/// any seat has moved on since.
#[derive(Debug, Clone)]
pub struct SeatChange {
    pub seat_id: Uuid,
    pub expected_version: i64,
    pub booked: bool,
    pub held: bool,
    pub hold_expiry: Option<DateTime<Utc>>,
    pub holder_session_id: Option<String>,
}

impl SeatChange {
    pub fn hold(seat: &Seat, session_id: &str, expiry: DateTime<Utc>) -> Self {
        Self {
            seat_id: seat.id,
            expected_version: seat.version,
            booked: false,
            held: true,
            hold_expiry: Some(expiry),
            holder_session_id: Some(session_id.to_string()),
        }
    }

    pub fn book(seat: &Seat) -> Self {
        Self {
            seat_id: seat.id,
            expected_version: seat.version,
            booked: true,
            held: false,
            hold_expiry: None,
            holder_session_id: None,
        }
    }

    /// Clears both the hold and the booking flags.
    pub fn free(seat: &Seat) -> Self {
        Self {
            seat_id: seat.id,
            expected_version: seat.version,
            booked: false,
            held: false,
            hold_expiry: None,
            holder_session_id: None,
        }
    }

    pub fn apply_to(&self, seat: &mut Seat) {
        seat.booked = self.booked;
        seat.held = self.held;
        seat.hold_expiry = self.hold_expiry;
        seat.holder_session_id = self.holder_session_id.clone();
        seat.version += 1;
    }
}
