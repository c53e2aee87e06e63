use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marquee_booking::{Booking, BookingStats, BookingStatus, BookingStore};
use marquee_core::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    showtime_id: String,
    seats: Vec<Uuid>,
    seat_labels: Vec<String>,
    total_amount: f64,
    ticket_price_snapshot: Option<f64>,
    screen_name: Option<String>,
    payment_method: String,
    payment_id: Option<String>,
    ticket_number: String,
    qr_code: String,
    status: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    refund_amount: Option<f64>,
    refund_date: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    cancellation_requested_at: Option<DateTime<Utc>>,
    booking_date: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            showtime_id: self.showtime_id,
            seats: self.seats,
            seat_labels: self.seat_labels,
            total_amount: self.total_amount,
            ticket_price_snapshot: self.ticket_price_snapshot,
            screen_name: self.screen_name,
            payment_method: self.payment_method,
            payment_id: self.payment_id,
            ticket_number: self.ticket_number,
            qr_code: self.qr_code,
            status: status_from_str(&self.status),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            refund_amount: self.refund_amount,
            refund_date: self.refund_date,
            cancellation_reason: self.cancellation_reason,
            cancellation_requested_at: self.cancellation_requested_at,
            booking_date: self.booking_date,
        }
    }
}

fn status_to_str(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "PENDING",
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::CancellationPending => "CANCELLATION_PENDING",
        BookingStatus::Cancelled => "CANCELLED",
    }
}

fn status_from_str(status: &str) -> BookingStatus {
    match status {
        "CONFIRMED" => BookingStatus::Confirmed,
        "CANCELLATION_PENDING" => BookingStatus::CancellationPending,
        "CANCELLED" => BookingStatus::Cancelled,
        _ => BookingStatus::Pending,
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

const SELECT_BOOKING: &str = "SELECT id, user_id, showtime_id, seats, seat_labels, total_amount, \
     ticket_price_snapshot, screen_name, payment_method, payment_id, ticket_number, qr_code, \
     status, customer_name, customer_email, customer_phone, refund_amount, refund_date, \
     cancellation_reason, cancellation_requested_at, booking_date FROM bookings";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings (id, user_id, showtime_id, seats, seat_labels, total_amount, \
             ticket_price_snapshot, screen_name, payment_method, payment_id, ticket_number, \
             qr_code, status, customer_name, customer_email, customer_phone, refund_amount, \
             refund_date, cancellation_reason, cancellation_requested_at, booking_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(&booking.showtime_id)
        .bind(&booking.seats)
        .bind(&booking.seat_labels)
        .bind(booking.total_amount)
        .bind(booking.ticket_price_snapshot)
        .bind(&booking.screen_name)
        .bind(&booking.payment_method)
        .bind(&booking.payment_id)
        .bind(&booking.ticket_number)
        .bind(&booking.qr_code)
        .bind(status_to_str(booking.status))
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(booking.refund_amount)
        .bind(booking.refund_date)
        .bind(&booking.cancellation_reason)
        .bind(booking.cancellation_requested_at)
        .bind(booking.booking_date)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("booking {}", booking.id))
            }
            _ => backend(e),
        })?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!("{SELECT_BOOKING} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(BookingRow::into_booking))
    }

    async fn update(&self, booking: &Booking) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings SET seats = $1, seat_labels = $2, payment_id = $3, status = $4, \
             refund_amount = $5, refund_date = $6, cancellation_reason = $7, \
             cancellation_requested_at = $8 WHERE id = $9",
        )
        .bind(&booking.seats)
        .bind(&booking.seat_labels)
        .bind(&booking.payment_id)
        .bind(status_to_str(booking.status))
        .bind(booking.refund_amount)
        .bind(booking.refund_date)
        .bind(&booking.cancellation_reason)
        .bind(booking.cancellation_requested_at)
        .bind(booking.id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("booking {}", booking.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("booking {id}")));
        }
        Ok(())
    }

    async fn by_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "{SELECT_BOOKING} WHERE user_id = $1 ORDER BY booking_date DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(BookingRow::into_booking).collect())
    }

    async fn all(&self) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> =
            sqlx::query_as(&format!("{SELECT_BOOKING} ORDER BY booking_date DESC"))
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
        Ok(rows.into_iter().map(BookingRow::into_booking).collect())
    }

    async fn by_status(&self, status: BookingStatus) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "{SELECT_BOOKING} WHERE status = $1 ORDER BY booking_date DESC"
        ))
        .bind(status_to_str(status))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(BookingRow::into_booking).collect())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<BookingStats, StoreError> {
        let (total, cancelled, last_7, last_30, seats): (i64, i64, i64, i64, Option<i64>) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                 COUNT(*) FILTER (WHERE status = 'CANCELLED'), \
                 COUNT(*) FILTER (WHERE booking_date >= $1), \
                 COUNT(*) FILTER (WHERE booking_date >= $2), \
                 SUM(cardinality(seats)) FROM bookings",
            )
            .bind(now - Duration::days(7))
            .bind(now - Duration::days(30))
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        Ok(BookingStats {
            total_bookings: total as u64,
            cancelled_bookings: cancelled as u64,
            bookings_last_7_days: last_7 as u64,
            bookings_last_30_days: last_30 as u64,
            total_seats_booked: seats.unwrap_or(0) as u64,
        })
    }
}
