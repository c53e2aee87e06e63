pub mod memory;
pub mod models;
pub mod razorpay;
pub mod saga;
pub mod store;

pub use memory::{MemoryPaymentStore, MemoryReconciliationStore};
pub use models::{
    Payment, PaymentMethod, PaymentStats, PaymentStatus, ReconciliationReason, ReconciliationRecord,
};
pub use razorpay::{MockGateway, RazorpayGateway};
pub use saga::{BookingPaymentSaga, SagaError, SagaReceipt, VerificationRequest};
pub use store::{PaymentStore, ReconciliationStore};
