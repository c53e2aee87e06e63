use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CancellationPending,
    Cancelled,
}

/// Durable record of a confirmed (or cancelled) purchase. Owns the seat-id
/// snapshot; a booked seat's id appears in exactly one non-cancelled
/// booking's seat list at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub showtime_id: String,
    pub seats: Vec<Uuid>,
    pub seat_labels: Vec<String>,
    pub total_amount: f64,
    pub ticket_price_snapshot: Option<f64>,
    pub screen_name: Option<String>,
    pub payment_method: String,
    pub payment_id: Option<String>,
    pub ticket_number: String,
    pub qr_code: String,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub refund_amount: Option<f64>,
    pub refund_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancellation_requested_at: Option<DateTime<Utc>>,
    pub booking_date: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: &str, request: NewBooking, seat_labels: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            showtime_id: request.showtime_id,
            seats: request.seats,
            seat_labels,
            total_amount: request.total_amount,
            ticket_price_snapshot: request.ticket_price_snapshot,
            screen_name: request.screen_name,
            payment_method: request.payment_method.unwrap_or_else(|| "ONLINE".to_string()),
            payment_id: None,
            ticket_number: generate_ticket_number(),
            qr_code: format!("QR_{}", Uuid::new_v4()),
            status: BookingStatus::Confirmed,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            refund_amount: None,
            refund_date: None,
            cancellation_reason: None,
            cancellation_requested_at: None,
            booking_date: Utc::now(),
        }
    }
}

fn generate_ticket_number() -> String {
    let token = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TKT{}", &token[..8])
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub showtime_id: String,
    pub seats: Vec<Uuid>,
    pub seat_labels: Vec<String>,
    pub total_amount: f64,
    pub ticket_price_snapshot: Option<f64>,
    pub screen_name: Option<String>,
    pub payment_method: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingStats {
    pub total_bookings: u64,
    pub cancelled_bookings: u64,
    pub bookings_last_7_days: u64,
    pub bookings_last_30_days: u64,
    pub total_seats_booked: u64,
}
