use std::net::SocketAddr;
use std::sync::Arc;

use marquee_api::{app, AppState};
use marquee_booking::{BookingLedger, BookingStore, MemoryBookingStore};
use marquee_core::{
    MovieLookup, PaymentGateway, ScreenLayoutLookup, ShowtimeLookup, TheaterLookup,
    UnconfiguredLookup,
};
use marquee_payment::{
    BookingPaymentSaga, MemoryPaymentStore, MemoryReconciliationStore, PaymentStore,
    RazorpayGateway, ReconciliationStore,
};
use marquee_seating::{MemorySeatStore, ReservationManager, SeatLedger, SeatStore};
use marquee_store::{
    app_config::Config, DbClient, HttpMovieLookup, HttpScreenLayoutLookup, HttpShowtimeLookup,
    HttpTheaterLookup, PgBookingStore, PgPaymentStore, PgReconciliationStore, PgSeatStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let stores: (
        Arc<dyn SeatStore>,
        Arc<dyn BookingStore>,
        Arc<dyn PaymentStore>,
        Arc<dyn ReconciliationStore>,
    ) = if config.database.backend == "postgres" {
        let url = config
            .database
            .url
            .clone()
            .expect("database.url is required for the postgres backend");
        let db = DbClient::new(&url, config.database.max_connections)
            .await
            .expect("Failed to connect to Postgres");
        db.migrate().await.expect("Failed to run migrations");
        (
            Arc::new(PgSeatStore::new(db.pool.clone())),
            Arc::new(PgBookingStore::new(db.pool.clone())),
            Arc::new(PgPaymentStore::new(db.pool.clone())),
            Arc::new(PgReconciliationStore::new(db.pool.clone())),
        )
    } else {
        tracing::warn!("using the in-memory store; state will not survive a restart");
        (
            Arc::new(MemorySeatStore::new()),
            Arc::new(MemoryBookingStore::new()),
            Arc::new(MemoryPaymentStore::new()),
            Arc::new(MemoryReconciliationStore::new()),
        )
    };
    let (seat_store, booking_store, payment_store, reconciliation_store) = stores;

    let showtimes: Arc<dyn ShowtimeLookup> = match &config.services.showtime_url {
        Some(url) => Arc::new(HttpShowtimeLookup::new(url)),
        None => Arc::new(UnconfiguredLookup),
    };
    let movies: Arc<dyn MovieLookup> = match &config.services.movie_url {
        Some(url) => Arc::new(HttpMovieLookup::new(url)),
        None => Arc::new(UnconfiguredLookup),
    };
    let theaters: Arc<dyn TheaterLookup> = match &config.services.theater_url {
        Some(url) => Arc::new(HttpTheaterLookup::new(url)),
        None => Arc::new(UnconfiguredLookup),
    };
    let layouts: Arc<dyn ScreenLayoutLookup> = match &config.services.theater_url {
        Some(url) => Arc::new(HttpScreenLayoutLookup::new(url)),
        None => Arc::new(UnconfiguredLookup),
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(match &config.gateway.base_url {
        Some(base) => {
            RazorpayGateway::with_base_url(&config.gateway.key_id, &config.gateway.key_secret, base)
        }
        None => RazorpayGateway::new(&config.gateway.key_id, &config.gateway.key_secret),
    });

    let rules = config.business_rules.clone();
    let seats = Arc::new(SeatLedger::new(seat_store.clone(), layouts));
    let reservations = Arc::new(ReservationManager::new(seat_store, rules.hold_minutes));
    let bookings = Arc::new(BookingLedger::new(
        booking_store,
        reservations.clone(),
        showtimes.clone(),
        movies,
        theaters,
        rules,
    ));
    let saga = Arc::new(BookingPaymentSaga::new(
        gateway,
        showtimes,
        bookings.clone(),
        payment_store.clone(),
        reconciliation_store.clone(),
    ));

    let app_state = AppState {
        seats,
        reservations,
        bookings,
        saga,
        payments: payment_store,
        reconciliations: reconciliation_store,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
