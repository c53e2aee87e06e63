pub mod ledger;
pub mod memory;
pub mod models;
pub mod response;
pub mod store;

pub use ledger::{BookingError, BookingLedger};
pub use memory::MemoryBookingStore;
pub use models::{Booking, BookingStats, BookingStatus, NewBooking};
pub use response::BookingView;
pub use store::BookingStore;
