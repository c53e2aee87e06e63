pub mod gateway;
pub mod lookups;
pub mod rules;
pub mod store;

pub use gateway::{GatewayError, GatewayOrder, PaymentGateway};
pub use lookups::{
    LayoutCell, LookupError, MovieLookup, MovieSummary, ScreenLayout, ScreenLayoutLookup,
    SeatCategorySpec, ShowtimeDetails, ShowtimeLookup, TheaterLookup, TheaterSummary,
    UnconfiguredLookup,
};
pub use rules::BookingRules;
pub use store::StoreError;
