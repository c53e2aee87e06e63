use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use marquee_booking::{BookingStats, BookingView, NewBooking};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/stats", get(booking_stats))
        .route("/api/bookings/cancellation-requests", get(cancellation_requests))
        .route("/api/bookings/user/{user_id}", get(user_bookings))
        .route("/api/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/api/bookings/{id}/request-cancellation", post(request_cancellation))
        .route("/api/bookings/{id}/cancel", post(cancel_booking))
        .route("/api/bookings/{id}/scan", post(scan_booking))
        .route("/api/bookings/{id}/resign", post(resign_booking))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    user_id: String,
    showtime_id: String,
    seats: Vec<Uuid>,
    #[serde(default)]
    seat_labels: Vec<String>,
    total_amount: f64,
    #[serde(default)]
    ticket_price_snapshot: Option<f64>,
    #[serde(default)]
    screen_name: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    customer_name: String,
    #[serde(default)]
    customer_email: String,
    #[serde(default)]
    customer_phone: String,
}

/// POST /api/bookings
/// Direct booking creation (inter-service path; the saga uses the same
/// ledger). Commits the seats and persists a CONFIRMED booking.
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state
        .bookings
        .create(
            &req.user_id,
            NewBooking {
                showtime_id: req.showtime_id,
                seats: req.seats,
                seat_labels: req.seat_labels,
                total_amount: req.total_amount,
                ticket_price_snapshot: req.ticket_price_snapshot,
                screen_name: req.screen_name,
                payment_method: req.payment_method,
                customer_name: req.customer_name,
                customer_email: req.customer_email,
                customer_phone: req.customer_phone,
            },
        )
        .await?;
    Ok(Json(state.bookings.view(booking).await))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    state
        .bookings
        .by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("booking not found: {id}")))
}

/// GET /api/bookings/user/{user_id}
async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(state.bookings.by_user(&user_id).await?))
}

/// GET /api/bookings
async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(state.bookings.all().await?))
}

/// GET /api/bookings/cancellation-requests
async fn cancellation_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(state.bookings.cancellation_requests().await?))
}

/// GET /api/bookings/stats
async fn booking_stats(State(state): State<AppState>) -> Result<Json<BookingStats>, AppError> {
    Ok(Json(state.bookings.stats().await?))
}

#[derive(Debug, Deserialize)]
struct CancellationRequest {
    #[serde(default)]
    reason: String,
}

/// POST /api/bookings/{id}/request-cancellation
async fn request_cancellation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancellationRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.request_cancellation(id, &req.reason).await?;
    Ok(Json(state.bookings.view(booking).await))
}

/// POST /api/bookings/{id}/cancel
/// Cancels the booking, releases its seats, and flips the payment row to
/// REFUNDED (bookkeeping only; the gateway refund is an operator concern).
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancellationRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.cancel(id, &req.reason).await?;
    if let Err(e) = state.payments.mark_refunded(&id.to_string()).await {
        warn!(booking_id = %id, error = %e, "failed to mark payment refunded");
    }
    Ok(Json(state.bookings.view(booking).await))
}

/// POST /api/bookings/{id}/scan
async fn scan_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.scan(id).await?;
    Ok(Json(state.bookings.view(booking).await))
}

#[derive(Debug, Deserialize)]
struct ResignRequest {
    seats: Vec<Uuid>,
}

/// POST /api/bookings/{id}/resign
async fn resign_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResignRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.bookings.resign(id, req.seats).await?;
    Ok(Json(state.bookings.view(booking).await))
}

/// DELETE /api/bookings/{id}
async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bookings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
