use std::sync::Arc;

use marquee_booking::{BookingError, BookingLedger, NewBooking};
use marquee_core::{GatewayError, GatewayOrder, PaymentGateway, ShowtimeLookup, StoreError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Payment, ReconciliationReason, ReconciliationRecord};
use crate::store::{PaymentStore, ReconciliationStore};

/// Everything the client sends back after completing checkout out-of-band.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub showtime_id: String,
    pub seats: Vec<Uuid>,
    pub seat_labels: Vec<String>,
    pub total_amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SagaReceipt {
    pub booking_id: Uuid,
    pub ticket_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SagaError {
    #[error("invalid payment signature")]
    InvalidSignature,

    #[error("showtime unavailable: {0}")]
    ShowtimeUnavailable(String),

    #[error("booking could not be created: {0}")]
    SeatConflict(#[source] BookingError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SagaError {
    /// True when the gateway captured funds but no booking was produced —
    /// different severity from an ordinary rejection, and the trigger for a
    /// durable reconciliation record.
    pub fn needs_reconciliation(&self) -> bool {
        matches!(self, Self::ShowtimeUnavailable(_) | Self::SeatConflict(_))
    }
}

/// The one fixed-shape saga in the system:
/// order → verify signature → commit seats + persist booking → record payment.
/// No step retries; every failure ends the run with a caller-visible reason.
/// Only `create_order` is safe to retry with the same inputs.
pub struct BookingPaymentSaga {
    gateway: Arc<dyn PaymentGateway>,
    showtimes: Arc<dyn ShowtimeLookup>,
    bookings: Arc<BookingLedger>,
    payments: Arc<dyn PaymentStore>,
    reconciliations: Arc<dyn ReconciliationStore>,
}

impl BookingPaymentSaga {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        showtimes: Arc<dyn ShowtimeLookup>,
        bookings: Arc<BookingLedger>,
        payments: Arc<dyn PaymentStore>,
        reconciliations: Arc<dyn ReconciliationStore>,
    ) -> Self {
        Self { gateway, showtimes, bookings, payments, reconciliations }
    }

    /// Step 1. Nothing else has happened yet, so a gateway failure here is
    /// terminal with no compensation.
    pub async fn create_order(&self, amount: f64, currency: &str) -> Result<GatewayOrder, SagaError> {
        Ok(self.gateway.create_order(amount, currency).await?)
    }

    /// Steps 2–5. The seats the client held are converted into a booking and
    /// a payment row, or the run ends failed with the appropriate bookkeeping.
    pub async fn verify_and_book(
        &self,
        user_id: &str,
        request: VerificationRequest,
    ) -> Result<SagaReceipt, SagaError> {
        if !self.gateway.verify_signature(
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.gateway_signature,
        ) {
            // Rejected before any money moved: audit row, no mutation.
            warn!(order_id = %request.gateway_order_id, "payment signature mismatch");
            let payment = Payment::failed(request.total_amount, &request.gateway_order_id);
            self.payments.insert(&payment).await?;
            return Err(SagaError::InvalidSignature);
        }

        let showtime = match self.showtimes.get_showtime(&request.showtime_id).await {
            Ok(showtime) => showtime,
            Err(e) => {
                error!(
                    order_id = %request.gateway_order_id,
                    payment_id = %request.gateway_payment_id,
                    error = %e,
                    "captured payment stranded: showtime lookup failed"
                );
                self.file_reconciliation(
                    user_id,
                    &request,
                    ReconciliationReason::ShowtimeUnavailable,
                    e.to_string(),
                )
                .await?;
                return Err(SagaError::ShowtimeUnavailable(e.to_string()));
            }
        };

        let new_booking = NewBooking {
            showtime_id: request.showtime_id.clone(),
            seats: request.seats.clone(),
            seat_labels: request.seat_labels.clone(),
            total_amount: request.total_amount,
            ticket_price_snapshot: showtime.ticket_price,
            screen_name: Some(showtime.screen_name),
            payment_method: None,
            customer_name: request.customer_name.clone(),
            customer_email: request.customer_email.clone(),
            customer_phone: request.customer_phone.clone(),
        };

        let booking = match self.bookings.create(user_id, new_booking).await {
            Ok(booking) => booking,
            Err(e) => {
                // The charge stands but no booking exists. No automatic
                // refund; the reconciliation record hands it to an operator.
                error!(
                    order_id = %request.gateway_order_id,
                    payment_id = %request.gateway_payment_id,
                    error = %e,
                    "captured payment stranded: booking creation failed"
                );
                self.file_reconciliation(
                    user_id,
                    &request,
                    ReconciliationReason::BookingFailed,
                    e.to_string(),
                )
                .await?;
                return Err(SagaError::SeatConflict(e));
            }
        };

        let payment = Payment::success(
            booking.id,
            request.total_amount,
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.gateway_signature,
        );
        self.payments.insert(&payment).await?;

        if let Err(e) = self.bookings.attach_payment(booking.id, &payment.id.to_string()).await {
            warn!(booking_id = %booking.id, error = %e, "failed to attach payment id to booking");
        }

        info!(
            booking_id = %booking.id,
            ticket = %booking.ticket_number,
            payment_id = %payment.id,
            "payment verified and booking confirmed"
        );
        Ok(SagaReceipt { booking_id: booking.id, ticket_number: booking.ticket_number })
    }

    /// Client-reported gateway failure. Analytics only: a FAILED payment row
    /// with a synthetic booking id, and no seat or booking mutation.
    pub async fn payment_failed(
        &self,
        user_id: &str,
        gateway_order_id: &str,
        total_amount: f64,
    ) -> Result<(), SagaError> {
        info!(user_id, order_id = gateway_order_id, "recording client-reported payment failure");
        let payment = Payment::failed(total_amount, gateway_order_id);
        self.payments.insert(&payment).await?;
        Ok(())
    }

    async fn file_reconciliation(
        &self,
        user_id: &str,
        request: &VerificationRequest,
        reason: ReconciliationReason,
        detail: String,
    ) -> Result<(), StoreError> {
        let record = ReconciliationRecord::new(
            user_id,
            &request.showtime_id,
            request.total_amount,
            &request.gateway_order_id,
            &request.gateway_payment_id,
            reason,
            detail,
        );
        self.reconciliations.insert(&record).await
    }
}
