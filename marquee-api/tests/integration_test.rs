use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use marquee_api::{app, AppState};
use marquee_booking::{BookingLedger, MemoryBookingStore};
use marquee_core::{
    BookingRules, LayoutCell, LookupError, ScreenLayout, ScreenLayoutLookup, SeatCategorySpec,
    ShowtimeDetails, ShowtimeLookup, UnconfiguredLookup,
};
use marquee_payment::{
    BookingPaymentSaga, MemoryPaymentStore, MemoryReconciliationStore, MockGateway,
};
use marquee_seating::{MemorySeatStore, ReservationManager, SeatLedger};
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubShowtimes;

#[async_trait]
impl ShowtimeLookup for StubShowtimes {
    async fn get_showtime(&self, id: &str) -> Result<ShowtimeDetails, LookupError> {
        Ok(ShowtimeDetails {
            id: id.to_string(),
            movie_id: "movie-1".into(),
            theater_id: "theater-1".into(),
            screen_name: "Screen 1".into(),
            show_date_time: Utc::now() + Duration::hours(24),
            ticket_price: Some(250.0),
        })
    }
}

struct StubLayouts;

#[async_trait]
impl ScreenLayoutLookup for StubLayouts {
    async fn get_screen_layout(&self, _screen_id: &str) -> Result<ScreenLayout, LookupError> {
        let mut cells = Vec::new();
        for row in 0..2u32 {
            for col in 0..3u32 {
                cells.push(LayoutCell {
                    row,
                    col,
                    category_id: "std".into(),
                    status: if row == 1 && col == 2 { "disabled".into() } else { "active".into() },
                });
            }
        }
        Ok(ScreenLayout {
            rows: 2,
            seats_per_row: 3,
            categories: vec![SeatCategorySpec {
                id: "std".into(),
                name: "Regular".into(),
                price: 250.0,
            }],
            cells,
        })
    }
}

fn test_app() -> (Router, Arc<MockGateway>) {
    let seat_store = Arc::new(MemorySeatStore::new());
    let showtimes: Arc<dyn ShowtimeLookup> = Arc::new(StubShowtimes);
    let rules = BookingRules::default();

    let seats = Arc::new(SeatLedger::new(seat_store.clone(), Arc::new(StubLayouts)));
    let reservations = Arc::new(ReservationManager::new(seat_store, rules.hold_minutes));
    let bookings = Arc::new(BookingLedger::new(
        Arc::new(MemoryBookingStore::new()),
        reservations.clone(),
        showtimes.clone(),
        Arc::new(UnconfiguredLookup),
        Arc::new(UnconfiguredLookup),
        rules,
    ));

    let gateway = Arc::new(MockGateway::new("integration-secret"));
    let payments = Arc::new(MemoryPaymentStore::new());
    let reconciliations = Arc::new(MemoryReconciliationStore::new());
    let saga = Arc::new(BookingPaymentSaga::new(
        gateway.clone(),
        showtimes,
        bookings.clone(),
        payments.clone(),
        reconciliations.clone(),
    ));

    let state = AppState {
        seats,
        reservations,
        bookings,
        saga,
        payments,
        reconciliations,
    };
    (app(state), gateway)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn initialize_and_pick_seats(app: &Router, count: usize) -> Vec<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/seats/initialize",
        Some(json!({ "showtime_id": "show-1", "screen_id": "screen-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 5);

    let (status, seats) = send(app, Method::GET, "/api/seats/showtime/show-1", None).await;
    assert_eq!(status, StatusCode::OK);
    let seats = seats.as_array().unwrap();
    assert_eq!(seats.len(), 5);

    seats
        .iter()
        .take(count)
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

async fn checkout(app: &Router, gateway: &MockGateway, seat_ids: &[String], amount: f64) -> Value {
    let (status, order) = send(
        app,
        Method::POST,
        "/api/payments/orders",
        Some(json!({ "amount": amount })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = order["order_id"].as_str().unwrap().to_string();
    assert_eq!(order["amount_minor"], (amount * 100.0) as i64);

    let payment_id = format!("pay_{}", &order_id[order_id.len() - 4..]);
    let signature = gateway.sign(&order_id, &payment_id);
    let (status, receipt) = send(
        app,
        Method::POST,
        "/api/payments/verify",
        Some(json!({
            "user_id": "user-1",
            "order_id": order_id,
            "payment_id": payment_id,
            "signature": signature,
            "showtime_id": "show-1",
            "seats": seat_ids,
            "total_amount": amount,
            "customer_name": "Asha Rao",
            "customer_email": "asha@example.com",
            "customer_phone": "9999900000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {receipt}");
    receipt
}

#[tokio::test]
async fn seat_lifecycle_over_http() {
    let (app, _) = test_app();
    let seat_ids = initialize_and_pick_seats(&app, 2).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/seats/hold",
        Some(json!({ "showtime_id": "show-1", "seat_ids": seat_ids, "session_id": "sess-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, seats) = send(&app, Method::GET, "/api/seats/showtime/show-1", None).await;
    let held: Vec<&Value> = seats
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["held"] == true)
        .collect();
    assert_eq!(held.len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/seats/release",
        Some(json!({ "showtime_id": "show-1", "seat_ids": seat_ids })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, seats) = send(&app, Method::GET, "/api/seats/showtime/show-1", None).await;
    assert!(seats.as_array().unwrap().iter().all(|s| s["held"] == false));

    // Initializing again is a no-op.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/seats/initialize",
        Some(json!({ "showtime_id": "show-1", "screen_id": "screen-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 0);
}

#[tokio::test]
async fn checkout_confirms_booking_and_conflicts_file_reconciliation() {
    let (app, gateway) = test_app();
    let seat_ids = initialize_and_pick_seats(&app, 2).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/seats/hold",
        Some(json!({ "showtime_id": "show-1", "seat_ids": seat_ids, "session_id": "sess-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let receipt = checkout(&app, &gateway, &seat_ids, 500.0).await;
    let booking_id = receipt["booking_id"].as_str().unwrap();
    assert!(receipt["ticket_number"].as_str().unwrap().starts_with("TKT"));

    let (status, booking) =
        send(&app, Method::GET, &format!("/api/bookings/{booking_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["screen"], "Screen 1");
    assert!(booking["payment_id"].is_string());

    let (_, seats) = send(&app, Method::GET, "/api/seats/showtime/show-1", None).await;
    let booked = seats
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["booked"] == true)
        .count();
    assert_eq!(booked, 2);

    // A rival pays for the same seats out-of-band: the charge captures but the
    // booking fails, landing in the reconciliation queue.
    let (status, order) =
        send(&app, Method::POST, "/api/payments/orders", Some(json!({ "amount": 500.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = order["order_id"].as_str().unwrap();
    let signature = gateway.sign(order_id, "pay_rival");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/payments/verify",
        Some(json!({
            "user_id": "user-2",
            "order_id": order_id,
            "payment_id": "pay_rival",
            "signature": signature,
            "showtime_id": "show-1",
            "seats": seat_ids,
            "total_amount": 500.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, queue) = send(&app, Method::GET, "/api/payments/reconciliation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["reason"], "BOOKING_FAILED");
    assert_eq!(queue[0]["gateway_payment_id"], "pay_rival");

    let (_, stats) = send(&app, Method::GET, "/api/payments/stats", None).await;
    assert_eq!(stats["successful_payments"], 1);
    assert_eq!(stats["total_revenue"], 500.0);
}

#[tokio::test]
async fn invalid_signature_leaves_seats_and_bookings_untouched() {
    let (app, _) = test_app();
    let seat_ids = initialize_and_pick_seats(&app, 2).await;

    let (status, order) =
        send(&app, Method::POST, "/api/payments/orders", Some(json!({ "amount": 500.0 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/verify",
        Some(json!({
            "user_id": "user-1",
            "order_id": order["order_id"],
            "payment_id": "pay_1",
            "signature": "deadbeef",
            "showtime_id": "show-1",
            "seats": seat_ids,
            "total_amount": 500.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid payment signature");

    let (_, seats) = send(&app, Method::GET, "/api/seats/showtime/show-1", None).await;
    assert!(seats.as_array().unwrap().iter().all(|s| s["booked"] == false));

    let (_, bookings) = send(&app, Method::GET, "/api/bookings", None).await;
    assert!(bookings.as_array().unwrap().is_empty());

    let (_, stats) = send(&app, Method::GET, "/api/payments/stats", None).await;
    assert_eq!(stats["failed_payments"], 1);
    assert_eq!(stats["successful_payments"], 0);
}

#[tokio::test]
async fn cancellation_refunds_and_reopens_seats() {
    let (app, gateway) = test_app();
    let seat_ids = initialize_and_pick_seats(&app, 2).await;

    let receipt = checkout(&app, &gateway, &seat_ids, 1000.0).await;
    let booking_id = receipt["booking_id"].as_str().unwrap();

    let (status, cancelled) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{booking_id}/cancel"),
        Some(json!({ "reason": "plans changed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["refund_amount"], 900.0);
    assert!(cancelled["refund_date"].is_string());

    let (_, seats) = send(&app, Method::GET, "/api/seats/showtime/show-1", None).await;
    assert!(seats.as_array().unwrap().iter().all(|s| s["booked"] == false));

    // A cancelled ticket neither scans nor cancels again.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{booking_id}/scan"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{booking_id}/cancel"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_reads_and_stats_round_trip() {
    let (app, gateway) = test_app();
    let seat_ids = initialize_and_pick_seats(&app, 3).await;

    let receipt = checkout(&app, &gateway, &seat_ids[..2], 500.0).await;
    let booking_id = receipt["booking_id"].as_str().unwrap();

    let (status, mine) = send(&app, Method::GET, "/api/bookings/user/user-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"].as_str().unwrap(), booking_id);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{booking_id}/request-cancellation"),
        Some(json!({ "reason": "ran late" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, pending) =
        send(&app, Method::GET, "/api/bookings/cancellation-requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["status"], "CANCELLATION_PENDING");

    let (status, stats) = send(&app, Method::GET, "/api/bookings/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_bookings"], 1);
    assert_eq!(stats["total_seats_booked"], 2);

    let (status, _) = send(&app, Method::GET, &format!("/api/bookings/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
