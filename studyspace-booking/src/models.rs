use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use studyspace_catalog::{FloorNumber, LocationId, SeatId, SeatPosition, SeatType};
use studyspace_shared::TimeWindow;

pub type BookingId = i64;
pub type GroupId = i64;

/// Booking duration applied when a stored record carries no usable value.
pub const DEFAULT_DURATION_HOURS: f64 = 2.0;

/// One reserved seat for one time window. A group booking is a set of these
/// sharing a `group_id`, created atomically. Records are never mutated in
/// place; create and cancel are the only lifecycle operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub group_id: GroupId,
    pub group_size: u32,
    pub group_index: u32,
    pub location_id: LocationId,
    pub location_name: String,
    #[serde(default)]
    pub floor_id: Option<FloorNumber>,
    pub seat_id: SeatId,
    pub seat_type: SeatType,
    pub seat_position: SeatPosition,
    pub date_time: DateTime<Utc>,
    pub duration: f64,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// The half-open window this booking occupies. Stored records with a
    /// missing or unusable duration fall back to the default.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.date_time, self.duration).unwrap_or(TimeWindow {
            start: self.date_time,
            end: self.date_time + Duration::hours(DEFAULT_DURATION_HOURS as i64),
        })
    }

    /// Upcoming bookings are those that have not started yet; the active
    /// bookings listing shows exactly these.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date_time > now
    }

    /// A booking is live until its window ends. Live bookings pin their seat
    /// against simulator churn.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.window().end > now
    }

    pub fn covers_seat(
        &self,
        location: LocationId,
        floor: Option<FloorNumber>,
        seat: &SeatId,
    ) -> bool {
        self.location_id == location && self.floor_id == floor && &self.seat_id == seat
    }
}

/// Input to `BookingLedger::create_group`. `starts_at` stays optional so a
/// confirm with an unset time field reports `MissingBookingTime` instead of
/// guessing.
#[derive(Debug, Clone)]
pub struct GroupBookingRequest {
    pub floor_id: Option<FloorNumber>,
    pub seat_ids: Vec<SeatId>,
    pub starts_at: Option<DateTime<Utc>>,
    pub duration_hours: f64,
    pub group_size: u32,
}
