use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marquee_booking::BookingError;
use marquee_core::StoreError;
use marquee_payment::SagaError;
use marquee_seating::{ReservationError, SeatError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    DependencyError(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::DependencyError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal Server Error: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            StoreError::Duplicate(_) => AppError::ConflictError(err.to_string()),
            other => AppError::InternalServerError(other.into()),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::SeatNotFound(_) => AppError::NotFoundError(err.to_string()),
            ReservationError::SeatUnavailable(_) => AppError::ConflictError(err.to_string()),
            ReservationError::Store(e) => AppError::InternalServerError(e.into()),
        }
    }
}

impl From<SeatError> for AppError {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::LayoutUnavailable(_) => AppError::DependencyError(err.to_string()),
            SeatError::Store(e) => AppError::InternalServerError(e.into()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            BookingError::Seats(e) => e.into(),
            BookingError::InvalidState
            | BookingError::AlreadyCancelled
            | BookingError::TicketCancelled => AppError::ConflictError(err.to_string()),
            BookingError::Store(e) => AppError::InternalServerError(e.into()),
        }
    }
}

impl From<SagaError> for AppError {
    fn from(err: SagaError) -> Self {
        match err {
            SagaError::InvalidSignature => AppError::ValidationError(err.to_string()),
            SagaError::ShowtimeUnavailable(_) => AppError::DependencyError(err.to_string()),
            SagaError::SeatConflict(_) => AppError::ConflictError(err.to_string()),
            SagaError::Gateway(_) => AppError::DependencyError(err.to_string()),
            SagaError::Store(e) => AppError::InternalServerError(e.into()),
        }
    }
}
