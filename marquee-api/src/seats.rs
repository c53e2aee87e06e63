use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use marquee_seating::Seat;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/seats/showtime/{showtime_id}", get(list_seats).delete(wipe_showtime))
        .route("/api/seats/initialize", post(initialize_seats))
        .route("/api/seats/hold", post(hold_seats))
        .route("/api/seats/release", post(release_seats))
}

/// GET /api/seats/showtime/{showtime_id}
/// List a showtime's seats, sweeping expired holds first.
async fn list_seats(
    State(state): State<AppState>,
    Path(showtime_id): Path<String>,
) -> Result<Json<Vec<Seat>>, AppError> {
    Ok(Json(state.seats.list_seats(&showtime_id).await?))
}

#[derive(Debug, Deserialize)]
struct InitializeSeatsRequest {
    showtime_id: String,
    screen_id: String,
}

/// POST /api/seats/initialize
/// Create the seat map from the screen layout; no-op if it already exists.
async fn initialize_seats(
    State(state): State<AppState>,
    Json(req): Json<InitializeSeatsRequest>,
) -> Result<Json<Value>, AppError> {
    let created = state.seats.initialize_seats(&req.showtime_id, &req.screen_id).await?;
    Ok(Json(json!({
        "message": "Seats initialized successfully",
        "created": created,
    })))
}

#[derive(Debug, Deserialize)]
struct HoldSeatsRequest {
    showtime_id: String,
    seat_ids: Vec<Uuid>,
    session_id: String,
}

/// POST /api/seats/hold
async fn hold_seats(
    State(state): State<AppState>,
    Json(req): Json<HoldSeatsRequest>,
) -> Result<Json<Value>, AppError> {
    state.reservations.hold(&req.showtime_id, &req.seat_ids, &req.session_id).await?;
    Ok(Json(json!({ "message": "Seats held successfully" })))
}

#[derive(Debug, Deserialize)]
struct ReleaseSeatsRequest {
    showtime_id: String,
    seat_ids: Vec<Uuid>,
}

/// POST /api/seats/release
async fn release_seats(
    State(state): State<AppState>,
    Json(req): Json<ReleaseSeatsRequest>,
) -> Result<Json<Value>, AppError> {
    state.reservations.release(&req.showtime_id, &req.seat_ids).await?;
    Ok(Json(json!({ "message": "Seats released successfully" })))
}

/// DELETE /api/seats/showtime/{showtime_id}
/// Admin: wipe the seat map so it can be re-initialized.
async fn wipe_showtime(
    State(state): State<AppState>,
    Path(showtime_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.seats.wipe_showtime(&showtime_id).await?;
    Ok(Json(json!({ "removed": removed })))
}
