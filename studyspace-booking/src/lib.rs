pub mod availability;
pub mod ledger;
pub mod models;
pub mod selection;

pub use availability::{free_seat_count, free_seats};
pub use ledger::{ActiveBookings, BookingLedger, LedgerError};
pub use models::{Booking, BookingId, GroupBookingRequest, GroupId, DEFAULT_DURATION_HOURS};
pub use selection::{SeatSelection, SeatToggle, SelectionError, SelectionState};
