pub mod ledger;
pub mod memory;
pub mod models;
pub mod reservation;
pub mod store;

pub use ledger::{SeatError, SeatLedger};
pub use memory::MemorySeatStore;
pub use models::{Seat, SeatCategory, SeatChange};
pub use reservation::{ReservationError, ReservationManager};
pub use store::SeatStore;
