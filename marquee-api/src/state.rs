use std::sync::Arc;

use marquee_booking::BookingLedger;
use marquee_payment::{BookingPaymentSaga, PaymentStore, ReconciliationStore};
use marquee_seating::{ReservationManager, SeatLedger};

#[derive(Clone)]
pub struct AppState {
    pub seats: Arc<SeatLedger>,
    pub reservations: Arc<ReservationManager>,
    pub bookings: Arc<BookingLedger>,
    pub saga: Arc<BookingPaymentSaga>,
    pub payments: Arc<dyn PaymentStore>,
    pub reconciliations: Arc<dyn ReconciliationStore>,
}
