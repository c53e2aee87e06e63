pub mod app_config;
pub mod booking_repo;
pub mod clients;
pub mod database;
pub mod payment_repo;
pub mod seat_repo;

pub use booking_repo::PgBookingStore;
pub use clients::{HttpMovieLookup, HttpScreenLayoutLookup, HttpShowtimeLookup, HttpTheaterLookup};
pub use database::DbClient;
pub use payment_repo::{PgPaymentStore, PgReconciliationStore};
pub use seat_repo::PgSeatStore;
