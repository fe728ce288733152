use chrono::{DateTime, Utc};
use serde::Serialize;
use studyspace_booking::{Booking, BookingId, GroupId};
use studyspace_catalog::{
    CrowdLevel, FloorNumber, LocationId, SeatId, SeatPosition, SeatStatus, SeatType,
};
use studyspace_shared::TimeWindow;

/// One location card of the home listing. When a search carried a date and
/// time, `available_seats` is the look-ahead count for that window and
/// `search_window` says which.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCard {
    pub id: LocationId,
    pub name: String,
    pub kind: String,
    pub address: String,
    pub region: Option<String>,
    pub available_seats: u32,
    pub total_seats: u32,
    pub crowd_level: CrowdLevel,
    pub facilities: Vec<String>,
    pub is_favorite: bool,
    pub distance_km: Option<f64>,
    pub search_window: Option<TimeWindow>,
}

/// One seat cell of the seat map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: SeatId,
    pub seat_type: SeatType,
    pub position: SeatPosition,
    pub status: SeatStatus,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorView {
    pub floor_number: FloorNumber,
    pub floor_name: String,
    pub description: Option<String>,
    pub available_seats: u32,
    pub total_seats: u32,
}

/// The seat map of the current view: the whole flat plan, or the selected
/// floor of a floored location. Aggregate counts always cover the whole
/// location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapView {
    pub location_id: LocationId,
    pub location_name: String,
    pub address: String,
    pub floor: Option<FloorView>,
    pub floors: Vec<FloorView>,
    pub available_seats: u32,
    pub total_seats: u32,
    pub crowd_level: CrowdLevel,
    pub seats: Vec<SeatView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSeat {
    pub booking_id: BookingId,
    pub seat_id: SeatId,
    pub seat_type: SeatType,
    pub seat_position: SeatPosition,
}

impl From<&Booking> for BookedSeat {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            seat_id: booking.seat_id.clone(),
            seat_type: booking.seat_type,
            seat_position: booking.seat_position,
        }
    }
}

/// One booking unit for confirmation modals and the bookings page: a group
/// with all of its seats, or a solo booking with one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub group_id: GroupId,
    pub location_name: String,
    pub group_size: u32,
    pub seats: Vec<BookedSeat>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub duration_hours: f64,
}

impl BookingSummary {
    pub fn from_group(bookings: &[Booking]) -> Option<Self> {
        let first = bookings.first()?;
        Some(Self {
            group_id: first.group_id,
            location_name: first.location_name.clone(),
            group_size: first.group_size,
            seats: bookings.iter().map(BookedSeat::from).collect(),
            starts_at: first.date_time,
            ends_at: first.window().end,
            duration_hours: first.duration,
        })
    }
}

/// Upcoming bookings shaped for the bookings page.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsPage {
    pub groups: Vec<BookingSummary>,
    pub singles: Vec<BookingSummary>,
}

/// Result of an availability query against one location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub location_id: LocationId,
    pub window: TimeWindow,
    pub available: u32,
    pub total: u32,
    pub seats: Vec<(Option<FloorNumber>, SeatId)>,
}
