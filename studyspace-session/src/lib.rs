pub mod session;
pub mod views;
pub mod worker;

pub use session::{BookingForm, SessionError, StudySession};
pub use views::{
    AvailabilityReport, BookedSeat, BookingSummary, BookingsPage, FloorView, LocationCard,
    SeatMapView, SeatView,
};
pub use worker::run_occupancy_worker;
