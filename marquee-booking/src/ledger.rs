use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use marquee_core::{BookingRules, MovieLookup, ShowtimeLookup, StoreError, TheaterLookup};
use marquee_seating::{ReservationError, ReservationManager};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Booking, BookingStats, BookingStatus, NewBooking};
use crate::response::{build_view, BookingView};
use crate::store::BookingStore;

const CANCELLATION_FEE_RATE: f64 = 0.10;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("booking not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Seats(#[from] ReservationError),

    #[error("only confirmed bookings can request cancellation")]
    InvalidState,

    #[error("booking is already cancelled")]
    AlreadyCancelled,

    #[error("ticket has been cancelled")]
    TicketCancelled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable booking records and their status transitions. Seat state is only
/// ever touched through the Reservation Manager.
pub struct BookingLedger {
    store: Arc<dyn BookingStore>,
    reservations: Arc<ReservationManager>,
    showtimes: Arc<dyn ShowtimeLookup>,
    movies: Arc<dyn MovieLookup>,
    theaters: Arc<dyn TheaterLookup>,
    rules: BookingRules,
}

impl BookingLedger {
    pub fn new(
        store: Arc<dyn BookingStore>,
        reservations: Arc<ReservationManager>,
        showtimes: Arc<dyn ShowtimeLookup>,
        movies: Arc<dyn MovieLookup>,
        theaters: Arc<dyn TheaterLookup>,
        rules: BookingRules,
    ) -> Self {
        Self { store, reservations, showtimes, movies, theaters, rules }
    }

    /// Commit the requested seats and persist a CONFIRMED booking. If the
    /// commit fails no row is created; if persisting fails the committed
    /// seats are released again.
    pub async fn create(&self, user_id: &str, request: NewBooking) -> Result<Booking, BookingError> {
        if request.seats.is_empty() {
            return Err(BookingError::Validation("no seats selected".into()));
        }
        if request.seats.len() > self.rules.max_seats_per_booking {
            return Err(BookingError::Validation(format!(
                "maximum {} seats can be booked at once",
                self.rules.max_seats_per_booking
            )));
        }

        let showtime_id = request.showtime_id.clone();
        let committed = self.reservations.commit(&showtime_id, &request.seats).await?;

        let labels = if request.seat_labels.is_empty() {
            let by_id: HashMap<Uuid, String> =
                committed.iter().map(|s| (s.id, s.label())).collect();
            request
                .seats
                .iter()
                .map(|id| by_id.get(id).cloned().unwrap_or_else(|| id.to_string()))
                .collect()
        } else {
            request.seat_labels.clone()
        };

        let booking = Booking::new(user_id, request, labels);
        if let Err(insert_err) = self.store.insert(&booking).await {
            warn!(
                booking_id = %booking.id,
                error = %insert_err,
                "booking persist failed, releasing committed seats"
            );
            if let Err(e) = self.reservations.uncommit(&showtime_id, &booking.seats).await {
                error!(booking_id = %booking.id, error = %e, "failed to release seats after persist failure");
            }
            return Err(insert_err.into());
        }

        info!(
            booking_id = %booking.id,
            user_id,
            seats = booking.seats.len(),
            ticket = %booking.ticket_number,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// CONFIRMED → CANCELLATION_PENDING. The cancellation window is enforced
    /// when the showtime is reachable; a failed lookup never blocks the
    /// request.
    pub async fn request_cancellation(&self, id: Uuid, reason: &str) -> Result<Booking, BookingError> {
        let mut booking = self.get(id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidState);
        }

        if let Ok(details) = self.showtimes.get_showtime(&booking.showtime_id).await {
            let window = Duration::hours(self.rules.cancellation_window_hours);
            if details.show_date_time - Utc::now() < window {
                return Err(BookingError::Validation(
                    "cancellation window for this showtime has closed".into(),
                ));
            }
        }

        booking.status = BookingStatus::CancellationPending;
        booking.cancellation_reason = Some(reason.to_string());
        booking.cancellation_requested_at = Some(Utc::now());
        self.store.update(&booking).await?;
        Ok(booking)
    }

    /// Cancel from any state except CANCELLED: releases the seats, applies
    /// the cancellation fee, stamps the refund.
    pub async fn cancel(&self, id: Uuid, reason: &str) -> Result<Booking, BookingError> {
        let mut booking = self.get(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        self.reservations.uncommit(&booking.showtime_id, &booking.seats).await?;

        booking.status = BookingStatus::Cancelled;
        if !reason.trim().is_empty() {
            booking.cancellation_reason = Some(reason.to_string());
        }
        booking.refund_amount = Some(booking.total_amount * (1.0 - CANCELLATION_FEE_RATE));
        booking.refund_date = Some(Utc::now());
        self.store.update(&booking).await?;

        info!(booking_id = %id, refund = booking.refund_amount, "booking cancelled");
        Ok(booking)
    }

    /// Gate scan: re-confirms any ticket that is not cancelled.
    pub async fn scan(&self, id: Uuid) -> Result<Booking, BookingError> {
        let mut booking = self.get(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::TicketCancelled);
        }

        booking.status = BookingStatus::Confirmed;
        self.store.update(&booking).await?;
        Ok(booking)
    }

    /// Move the booking onto a different seat set. On conflict the original
    /// seats stay booked and the record is unchanged.
    pub async fn resign(&self, id: Uuid, new_seats: Vec<Uuid>) -> Result<Booking, BookingError> {
        let mut booking = self.get(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::TicketCancelled);
        }
        if new_seats.is_empty() {
            return Err(BookingError::Validation("no seats selected".into()));
        }
        if new_seats.len() > self.rules.max_seats_per_booking {
            return Err(BookingError::Validation(format!(
                "maximum {} seats can be booked at once",
                self.rules.max_seats_per_booking
            )));
        }

        let moved = self
            .reservations
            .reassign(&booking.showtime_id, &booking.seats, &new_seats)
            .await?;
        let by_id: HashMap<Uuid, String> = moved.iter().map(|s| (s.id, s.label())).collect();

        booking.seat_labels = new_seats
            .iter()
            .map(|seat_id| by_id.get(seat_id).cloned().unwrap_or_else(|| seat_id.to_string()))
            .collect();
        booking.seats = new_seats;
        self.store.update(&booking).await?;
        Ok(booking)
    }

    /// Administrative removal. Seat release is best-effort.
    pub async fn delete(&self, id: Uuid) -> Result<(), BookingError> {
        let booking = self.get(id).await?;
        if let Err(e) = self.reservations.uncommit(&booking.showtime_id, &booking.seats).await {
            warn!(booking_id = %id, error = %e, "seat release failed while deleting booking");
        }
        self.store.delete(id).await?;
        Ok(())
    }

    /// Record the payment that settled this booking.
    pub async fn attach_payment(&self, id: Uuid, payment_id: &str) -> Result<(), BookingError> {
        let mut booking = self.get(id).await?;
        booking.payment_id = Some(payment_id.to_string());
        self.store.update(&booking).await?;
        Ok(())
    }

    pub async fn by_id(&self, id: Uuid) -> Result<Option<BookingView>, BookingError> {
        match self.store.get(id).await? {
            Some(booking) => Ok(Some(self.view(booking).await)),
            None => Ok(None),
        }
    }

    pub async fn by_user(&self, user_id: &str) -> Result<Vec<BookingView>, BookingError> {
        self.views(self.store.by_user(user_id).await?).await
    }

    pub async fn all(&self) -> Result<Vec<BookingView>, BookingError> {
        self.views(self.store.all().await?).await
    }

    pub async fn cancellation_requests(&self) -> Result<Vec<BookingView>, BookingError> {
        self.views(self.store.by_status(BookingStatus::CancellationPending).await?).await
    }

    pub async fn stats(&self) -> Result<BookingStats, BookingError> {
        Ok(self.store.stats(Utc::now()).await?)
    }

    pub async fn view(&self, booking: Booking) -> BookingView {
        build_view(
            booking,
            self.showtimes.as_ref(),
            self.movies.as_ref(),
            self.theaters.as_ref(),
        )
        .await
    }

    async fn views(&self, bookings: Vec<Booking>) -> Result<Vec<BookingView>, BookingError> {
        let mut views = Vec::with_capacity(bookings.len());
        for booking in bookings {
            views.push(self.view(booking).await);
        }
        Ok(views)
    }

    async fn get(&self, id: Uuid) -> Result<Booking, BookingError> {
        self.store.get(id).await?.ok_or(BookingError::NotFound(id))
    }
}
