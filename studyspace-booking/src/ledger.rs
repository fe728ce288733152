use crate::models::{Booking, BookingId, GroupBookingRequest, GroupId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use studyspace_catalog::{Catalog, FloorNumber, LocationId, SeatId, SeatStatus};
use studyspace_shared::{InvalidTimeWindow, TimeWindow};
use tracing::info;

/// The booking ledger. Owns every booking record and is the only place that
/// flips seat occupancy together with ledger membership, so the two can never
/// drift apart.
#[derive(Debug, Clone, Default)]
pub struct BookingLedger {
    bookings: Vec<Booking>,
    last_issued_id: i64,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records. Id generation resumes above
    /// the highest stored id.
    pub fn from_records(records: Vec<Booking>) -> Self {
        let last_issued_id = records.iter().map(|b| b.id).max().unwrap_or(0);
        Self {
            bookings: records,
            last_issued_id,
        }
    }

    pub fn records(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn get(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn group(&self, group_id: GroupId) -> Vec<&Booking> {
        self.bookings
            .iter()
            .filter(|b| b.group_id == group_id)
            .collect()
    }

    /// Whether a seat is pinned by a booking whose window has not ended.
    /// The simulator consults this before freeing an occupied seat.
    pub fn has_live_booking(
        &self,
        location: LocationId,
        floor: Option<FloorNumber>,
        seat: &SeatId,
        now: DateTime<Utc>,
    ) -> bool {
        self.bookings
            .iter()
            .any(|b| b.covers_seat(location, floor, seat) && b.is_live(now))
    }

    /// Create one booking per seat, all sharing a fresh group id. Atomic:
    /// every seat is validated against live status and the existing ledger
    /// before anything is mutated, so a single stale seat aborts the whole
    /// group with no partial state.
    pub fn create_group(
        &mut self,
        catalog: &mut Catalog,
        location_id: LocationId,
        request: GroupBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, LedgerError> {
        if request.seat_ids.len() as u32 != request.group_size {
            return Err(LedgerError::GroupSizeMismatch {
                selected: request.seat_ids.len(),
                group_size: request.group_size,
            });
        }
        let starts_at = request.starts_at.ok_or(LedgerError::MissingBookingTime)?;
        let window = TimeWindow::new(starts_at, request.duration_hours)?;
        let location = catalog
            .get_mut(location_id)
            .ok_or(LedgerError::UnknownLocation(location_id))?;

        let mut seen = HashSet::new();
        let mut seat_details = Vec::with_capacity(request.seat_ids.len());
        for seat_id in &request.seat_ids {
            if !seen.insert(seat_id) {
                return Err(LedgerError::SeatConflict {
                    seat: seat_id.clone(),
                });
            }
            let seat = location
                .seat(request.floor_id, seat_id)
                .ok_or_else(|| LedgerError::SeatConflict {
                    seat: seat_id.clone(),
                })?;
            if !seat.is_available() {
                return Err(LedgerError::SeatConflict {
                    seat: seat_id.clone(),
                });
            }
            let already_booked = self.bookings.iter().any(|b| {
                b.covers_seat(location_id, request.floor_id, seat_id)
                    && b.window().overlaps(&window)
            });
            if already_booked {
                return Err(LedgerError::SeatConflict {
                    seat: seat_id.clone(),
                });
            }
            seat_details.push((seat.seat_type, seat.position));
        }

        let group_id = self.next_group_id(now, request.seat_ids.len());
        let location_name = match request.floor_id.and_then(|n| location.floor(n)) {
            Some(floor) => format!("{} - {}", location.name, floor.floor_name),
            None => location.name.clone(),
        };

        let mut created = Vec::with_capacity(request.seat_ids.len());
        for (index, seat_id) in request.seat_ids.iter().enumerate() {
            if let Some(seat) = location.seat_mut(request.floor_id, seat_id) {
                seat.status = SeatStatus::Occupied;
            }
            let (seat_type, seat_position) = seat_details[index];
            created.push(Booking {
                id: group_id + index as i64,
                group_id,
                group_size: request.group_size,
                group_index: index as u32 + 1,
                location_id,
                location_name: location_name.clone(),
                floor_id: request.floor_id,
                seat_id: seat_id.clone(),
                seat_type,
                seat_position,
                date_time: starts_at,
                duration: request.duration_hours,
                booked_at: now,
            });
        }
        location.recompute_counts();
        self.bookings.extend(created.iter().cloned());

        info!(
            group_id,
            seats = created.len(),
            location = location_name.as_str(),
            "group booking created"
        );
        Ok(created)
    }

    /// Cancel one booking, restoring its seat and the location's derived
    /// counts.
    pub fn cancel(&mut self, catalog: &mut Catalog, id: BookingId) -> Result<Booking, LedgerError> {
        let index = self
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(LedgerError::BookingNotFound(id))?;
        let booking = self.bookings.remove(index);
        release_seat(catalog, &booking);
        info!(booking_id = id, seat = %booking.seat_id, "booking cancelled");
        Ok(booking)
    }

    /// Cancel every booking of a group. The matching set is snapshotted
    /// before any seat is touched.
    pub fn cancel_group(
        &mut self,
        catalog: &mut Catalog,
        group_id: GroupId,
    ) -> Result<Vec<Booking>, LedgerError> {
        let matching: Vec<BookingId> = self
            .bookings
            .iter()
            .filter(|b| b.group_id == group_id)
            .map(|b| b.id)
            .collect();
        if matching.is_empty() {
            return Err(LedgerError::GroupNotFound(group_id));
        }

        let mut removed = Vec::with_capacity(matching.len());
        for id in matching {
            if let Some(index) = self.bookings.iter().position(|b| b.id == id) {
                let booking = self.bookings.remove(index);
                release_seat(catalog, &booking);
                removed.push(booking);
            }
        }
        info!(group_id, seats = removed.len(), "group booking cancelled");
        Ok(removed)
    }

    /// Upcoming bookings, group bookings collected into one unit each and
    /// solo bookings listed separately.
    pub fn list_active(&self, now: DateTime<Utc>) -> ActiveBookings {
        let mut groups: Vec<Vec<Booking>> = Vec::new();
        let mut singles = Vec::new();
        for booking in self.bookings.iter().filter(|b| b.is_upcoming(now)) {
            if booking.group_size > 1 {
                match groups.iter_mut().find(|g| g[0].group_id == booking.group_id) {
                    Some(group) => group.push(booking.clone()),
                    None => groups.push(vec![booking.clone()]),
                }
            } else {
                singles.push(booking.clone());
            }
        }
        ActiveBookings { groups, singles }
    }

    /// Time-based id generation: epoch millis of the creation instant, bumped
    /// past every previously issued id so same-millisecond calls stay unique.
    fn next_group_id(&mut self, now: DateTime<Utc>, seats: usize) -> GroupId {
        let mut candidate = now.timestamp_millis();
        if candidate <= self.last_issued_id {
            candidate = self.last_issued_id + 1;
        }
        self.last_issued_id = candidate + seats as i64 - 1;
        candidate
    }
}

fn release_seat(catalog: &mut Catalog, booking: &Booking) {
    if let Some(location) = catalog.get_mut(booking.location_id) {
        if let Some(seat) = location.seat_mut(booking.floor_id, &booking.seat_id) {
            seat.status = SeatStatus::Available;
        }
        location.recompute_counts();
    }
}

/// Upcoming bookings shaped for the listing: one entry per group, singles on
/// their own.
#[derive(Debug, Clone, Default)]
pub struct ActiveBookings {
    pub groups: Vec<Vec<Booking>>,
    pub singles: Vec<Booking>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("selected {selected} seats for a group of {group_size}")]
    GroupSizeMismatch { selected: usize, group_size: u32 },

    #[error("no booking time was provided")]
    MissingBookingTime,

    #[error(transparent)]
    InvalidWindow(#[from] InvalidTimeWindow),

    #[error("unknown location: {0}")]
    UnknownLocation(LocationId),

    #[error("seat {seat} is no longer available")]
    SeatConflict { seat: SeatId },

    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("group booking not found: {0}")]
    GroupNotFound(GroupId),
}
