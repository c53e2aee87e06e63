use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::StoreError;
use marquee_seating::{Seat, SeatCategory, SeatChange, SeatStore};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgSeatStore {
    pool: PgPool,
}

impl PgSeatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    showtime_id: String,
    seat_row: String,
    seat_number: i32,
    price: f64,
    category: String,
    booked: bool,
    held: bool,
    hold_expiry: Option<DateTime<Utc>>,
    holder_session_id: Option<String>,
    disabled: bool,
    version: i64,
}

impl SeatRow {
    fn into_seat(self) -> Seat {
        Seat {
            id: self.id,
            showtime_id: self.showtime_id,
            row: self.seat_row,
            number: self.seat_number,
            price: self.price,
            category: category_from_str(&self.category),
            booked: self.booked,
            held: self.held,
            hold_expiry: self.hold_expiry,
            holder_session_id: self.holder_session_id,
            disabled: self.disabled,
            version: self.version,
        }
    }
}

fn category_to_str(category: SeatCategory) -> &'static str {
    match category {
        SeatCategory::Regular => "REGULAR",
        SeatCategory::Premium => "PREMIUM",
        SeatCategory::Vip => "VIP",
    }
}

fn category_from_str(category: &str) -> SeatCategory {
    match category {
        "PREMIUM" => SeatCategory::Premium,
        "VIP" => SeatCategory::Vip,
        _ => SeatCategory::Regular,
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

const SELECT_SEAT: &str = "SELECT id, showtime_id, seat_row, seat_number, price, category, booked, \
     held, hold_expiry, holder_session_id, disabled, version FROM seats";

#[async_trait]
impl SeatStore for PgSeatStore {
    async fn list(&self, showtime_id: &str) -> Result<Vec<Seat>, StoreError> {
        let rows: Vec<SeatRow> = sqlx::query_as(&format!(
            "{SELECT_SEAT} WHERE showtime_id = $1 ORDER BY seat_row, seat_number"
        ))
        .bind(showtime_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(SeatRow::into_seat).collect())
    }

    async fn get_batch(&self, showtime_id: &str, seat_ids: &[Uuid]) -> Result<Vec<Seat>, StoreError> {
        let rows: Vec<SeatRow> = sqlx::query_as(&format!(
            "{SELECT_SEAT} WHERE showtime_id = $1 AND id = ANY($2)"
        ))
        .bind(showtime_id)
        .bind(seat_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(SeatRow::into_seat).collect())
    }

    async fn insert_batch(&self, seats: Vec<Seat>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        for seat in seats {
            sqlx::query(
                "INSERT INTO seats (id, showtime_id, seat_row, seat_number, price, category, \
                 booked, held, hold_expiry, holder_session_id, disabled, version) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(seat.id)
            .bind(&seat.showtime_id)
            .bind(&seat.row)
            .bind(seat.number)
            .bind(seat.price)
            .bind(category_to_str(seat.category))
            .bind(seat.booked)
            .bind(seat.held)
            .bind(seat.hold_expiry)
            .bind(&seat.holder_session_id)
            .bind(seat.disabled)
            .bind(seat.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    StoreError::Duplicate(format!("seat {}", seat.id))
                }
                _ => backend(e),
            })?;
        }
        tx.commit().await.map_err(backend)
    }

    async fn count(&self, showtime_id: &str) -> Result<u64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM seats WHERE showtime_id = $1")
                .bind(showtime_id)
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count as u64)
    }

    /// Row locks in a stable order, then version-checked writes. Either the
    /// whole batch lands or the transaction rolls back untouched.
    async fn apply(&self, showtime_id: &str, changes: &[SeatChange]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let ids: Vec<Uuid> = changes.iter().map(|c| c.seat_id).collect();

        let locked: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT id, version FROM seats WHERE showtime_id = $1 AND id = ANY($2) \
             ORDER BY id FOR UPDATE",
        )
        .bind(showtime_id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;
        let current: HashMap<Uuid, i64> = locked.into_iter().collect();

        for change in changes {
            let version = current
                .get(&change.seat_id)
                .ok_or_else(|| StoreError::NotFound(format!("seat {}", change.seat_id)))?;
            if *version != change.expected_version {
                // Dropping the transaction rolls everything back.
                return Err(StoreError::VersionConflict { seat_id: change.seat_id });
            }
        }

        for change in changes {
            sqlx::query(
                "UPDATE seats SET booked = $1, held = $2, hold_expiry = $3, \
                 holder_session_id = $4, version = version + 1 WHERE id = $5",
            )
            .bind(change.booked)
            .bind(change.held)
            .bind(change.hold_expiry)
            .bind(&change.holder_session_id)
            .bind(change.seat_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)
    }

    async fn clear_expired_holds(&self, showtime_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE seats SET held = FALSE, hold_expiry = NULL, holder_session_id = NULL, \
             version = version + 1 \
             WHERE showtime_id = $1 AND held AND hold_expiry < $2",
        )
        .bind(showtime_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected())
    }

    async fn wipe_showtime(&self, showtime_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM seats WHERE showtime_id = $1")
            .bind(showtime_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }
}
