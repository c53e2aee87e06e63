use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use marquee_core::GatewayOrder;
use marquee_payment::{Payment, PaymentStats, ReconciliationRecord, SagaReceipt, VerificationRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/orders", post(create_order))
        .route("/api/payments/verify", post(verify_payment))
        .route("/api/payments/failure", post(payment_failure))
        .route("/api/payments/status/{transaction_id}", get(payment_status))
        .route("/api/payments/stats", get(payment_stats))
        .route("/api/payments/reconciliation", get(reconciliation_queue))
}

#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    amount: f64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

/// POST /api/payments/orders
/// Saga step 1: create the gateway order the client pays against. Safe to
/// retry; an abandoned order simply expires with its seat holds.
async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<GatewayOrder>, AppError> {
    Ok(Json(state.saga.create_order(req.amount, &req.currency).await?))
}

#[derive(Debug, Deserialize)]
struct VerifyPaymentRequest {
    user_id: String,
    order_id: String,
    payment_id: String,
    signature: String,
    showtime_id: String,
    seats: Vec<Uuid>,
    #[serde(default)]
    seat_labels: Vec<String>,
    total_amount: f64,
    #[serde(default)]
    customer_name: String,
    #[serde(default)]
    customer_email: String,
    #[serde(default)]
    customer_phone: String,
}

/// POST /api/payments/verify
/// Saga steps 2–5: verify the gateway callback and convert the held seats
/// into a confirmed booking plus a payment row.
async fn verify_payment(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<SagaReceipt>, AppError> {
    let receipt = state
        .saga
        .verify_and_book(
            &req.user_id,
            VerificationRequest {
                gateway_order_id: req.order_id,
                gateway_payment_id: req.payment_id,
                gateway_signature: req.signature,
                showtime_id: req.showtime_id,
                seats: req.seats,
                seat_labels: req.seat_labels,
                total_amount: req.total_amount,
                customer_name: req.customer_name,
                customer_email: req.customer_email,
                customer_phone: req.customer_phone,
            },
        )
        .await?;
    Ok(Json(receipt))
}

#[derive(Debug, Deserialize)]
struct PaymentFailureRequest {
    user_id: String,
    order_id: String,
    total_amount: f64,
}

/// POST /api/payments/failure
/// Client-reported gateway failure; analytics bookkeeping only.
async fn payment_failure(
    State(state): State<AppState>,
    Json(req): Json<PaymentFailureRequest>,
) -> Result<Json<Value>, AppError> {
    state.saga.payment_failed(&req.user_id, &req.order_id, req.total_amount).await?;
    Ok(Json(json!({ "message": "Payment failure recorded" })))
}

/// GET /api/payments/status/{transaction_id}
async fn payment_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Payment>, AppError> {
    state
        .payments
        .by_transaction(&transaction_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("payment not found: {transaction_id}")))
}

/// GET /api/payments/stats
async fn payment_stats(State(state): State<AppState>) -> Result<Json<PaymentStats>, AppError> {
    Ok(Json(state.payments.stats(Utc::now()).await?))
}

/// GET /api/payments/reconciliation
/// Captured payments that produced no booking; the operator refund queue.
async fn reconciliation_queue(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReconciliationRecord>>, AppError> {
    Ok(Json(state.reconciliations.open().await?))
}
