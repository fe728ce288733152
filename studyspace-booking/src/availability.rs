use crate::models::Booking;
use chrono::{DateTime, Utc};
use studyspace_catalog::{FloorNumber, Location, Seat};
use studyspace_shared::TimeWindow;

/// Whether one seat is free for the requested window.
///
/// A seat is unavailable if an existing booking for its composite key
/// overlaps the window (strict half-open test), or if the window starts at or
/// before `now` and the seat's live status is occupied. The status check
/// covers simulator churn and seed-data occupancy that has no booking record.
pub fn seat_is_free(
    location: &Location,
    floor: Option<FloorNumber>,
    seat: &Seat,
    bookings: &[Booking],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> bool {
    let booked_over_window = bookings.iter().any(|b| {
        b.covers_seat(location.id, floor, &seat.id) && b.window().overlaps(&window)
    });
    if booked_over_window {
        return false;
    }
    if window.start <= now && !seat.is_available() {
        return false;
    }
    true
}

/// The seats of a location free for the requested window, with their floor
/// numbers. Flat and floored plans are flattened into one logical collection.
/// Pure: reads the catalog, the ledger and the supplied clock instant only.
pub fn free_seats<'a>(
    location: &'a Location,
    bookings: &[Booking],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<(Option<FloorNumber>, &'a Seat)> {
    location
        .seats_with_floor()
        .filter(|(floor, seat)| seat_is_free(location, *floor, seat, bookings, window, now))
        .collect()
}

pub fn free_seat_count(
    location: &Location,
    bookings: &[Booking],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> usize {
    free_seats(location, bookings, window, now).len()
}
