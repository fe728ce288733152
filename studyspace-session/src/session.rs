use crate::views::{
    AvailabilityReport, BookingSummary, BookingsPage, FloorView, LocationCard, SeatMapView,
    SeatView,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use studyspace_booking::{
    availability, BookingId, BookingLedger, GroupBookingRequest, GroupId, LedgerError,
    SeatSelection, SeatToggle, SelectionError, DEFAULT_DURATION_HOURS,
};
use studyspace_catalog::{
    search, Catalog, Coordinates, Floor, FloorNumber, Location, LocationId, SearchFilters, Seat,
    SeatId, SeatStatus,
};
use studyspace_shared::{Clock, InvalidTimeWindow, TimeWindow};
use studyspace_sim::{ChurnEvent, OccupancySimulator};
use studyspace_store::{self as store, KvStore};
use tracing::info;
use uuid::Uuid;

/// Ephemeral booking-form state, pre-filled from the last search filters
/// when a location is opened.
#[derive(Debug, Clone)]
pub struct BookingForm {
    pub starts_at: Option<DateTime<Utc>>,
    pub duration_hours: f64,
    pub group_size: u32,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            starts_at: None,
            duration_hours: DEFAULT_DURATION_HOURS,
            group_size: 1,
        }
    }
}

/// The location and floor the seat map currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewContext {
    location_id: LocationId,
    floor: Option<FloorNumber>,
}

/// One user's session. Owns the catalog, the ledger, the in-progress seat
/// selection and the persisted favorites; nothing lives in ambient state, so
/// independent sessions can coexist and tests drive the whole flow.
///
/// All operations are synchronous; callers running the simulator worker wrap
/// the session in a mutex so booking operations and ticks serialize.
pub struct StudySession {
    id: Uuid,
    catalog: Catalog,
    ledger: BookingLedger,
    selection: SeatSelection,
    form: BookingForm,
    filters: SearchFilters,
    favorites: Vec<LocationId>,
    user_location: Option<Coordinates>,
    context: Option<ViewContext>,
    simulator: OccupancySimulator,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl StudySession {
    /// Start a session: load the persisted collections and replay live
    /// bookings onto seat occupancy so status, counts and ledger agree.
    pub fn new(catalog: Catalog, store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let records = store::load_bookings(store.as_ref());
        let favorites = store::load_favorites(store.as_ref());
        let mut session = Self {
            id: Uuid::new_v4(),
            catalog,
            ledger: BookingLedger::from_records(records),
            selection: SeatSelection::new(1),
            form: BookingForm::default(),
            filters: SearchFilters::default(),
            favorites,
            user_location: None,
            context: None,
            simulator: OccupancySimulator::default(),
            store,
            clock,
        };
        session.rehydrate();
        info!(
            session = %session.id,
            bookings = session.ledger.len(),
            favorites = session.favorites.len(),
            "session started"
        );
        session
    }

    /// Replace the churn simulator, e.g. with a seeded one in tests or a
    /// configured probability from app config.
    pub fn with_simulator(mut self, simulator: OccupancySimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    pub fn selection(&self) -> &SeatSelection {
        &self.selection
    }

    pub fn booking_form(&self) -> &BookingForm {
        &self.form
    }

    pub fn set_user_location(&mut self, coordinates: Option<Coordinates>) {
        self.user_location = coordinates;
    }

    /// Search the catalog. With a date and time in the filters each card
    /// reports the look-ahead count for that window instead of the live one;
    /// malformed date or time input is rejected, never treated as available.
    pub fn search(&mut self, filters: SearchFilters) -> Result<Vec<LocationCard>, SessionError> {
        let window = match (filters.date.as_deref(), filters.time.as_deref()) {
            (Some(date), Some(time)) => {
                Some(TimeWindow::parse(date, time, filters.duration_hours)?)
            }
            _ => None,
        };
        self.filters = filters;

        let now = self.clock.now();
        let results = search::search(&self.catalog, &self.filters, self.user_location);
        Ok(results
            .into_iter()
            .map(|location| {
                let available = match window {
                    Some(window) => availability::free_seat_count(
                        location,
                        self.ledger.records(),
                        window,
                        now,
                    ) as u32,
                    None => location.available_seats,
                };
                self.card(location, available, window)
            })
            .collect())
    }

    /// The unfiltered home listing with live counts.
    pub fn location_cards(&self) -> Vec<LocationCard> {
        self.catalog
            .locations()
            .iter()
            .map(|location| self.card(location, location.available_seats, None))
            .collect()
    }

    pub fn category_counts(&self) -> search::CategoryCounts {
        search::category_counts(&self.catalog)
    }

    /// Open a location's seat map. Any selection from a previous view is
    /// dropped and the booking form is pre-filled from the last search.
    /// Floored locations open on their first floor.
    pub fn open_location(&mut self, id: LocationId) -> Result<SeatMapView, SessionError> {
        let floor = {
            let location = self
                .catalog
                .get(id)
                .ok_or(SessionError::UnknownLocation(id))?;
            location.floors().first().map(|f| f.floor_number)
        };
        self.context = Some(ViewContext {
            location_id: id,
            floor,
        });
        self.prefill_form();
        self.seat_map()
    }

    /// Switch floors. The selection is cleared so seat ids cannot leak
    /// across floors into a booking.
    pub fn select_floor(&mut self, floor_number: FloorNumber) -> Result<SeatMapView, SessionError> {
        let context = self.context.ok_or(SessionError::NoLocationOpen)?;
        {
            let location = self
                .catalog
                .get(context.location_id)
                .ok_or(SessionError::UnknownLocation(context.location_id))?;
            if location.floor(floor_number).is_none() {
                return Err(SessionError::UnknownFloor {
                    location: context.location_id,
                    floor: floor_number,
                });
            }
        }
        self.context = Some(ViewContext {
            location_id: context.location_id,
            floor: Some(floor_number),
        });
        self.selection.clear();
        self.seat_map()
    }

    /// Toggle a seat of the current view in or out of the selection.
    pub fn select_seat(&mut self, seat_id: &SeatId) -> Result<SeatToggle, SessionError> {
        let context = self.context.ok_or(SessionError::NoLocationOpen)?;
        let status = self
            .catalog
            .get(context.location_id)
            .and_then(|l| l.seat(context.floor, seat_id))
            .map(|s| s.status)
            .ok_or_else(|| SessionError::UnknownSeat(seat_id.clone()))?;
        Ok(self.selection.toggle(seat_id, status)?)
    }

    pub fn set_group_size(&mut self, size: u32) {
        self.form.group_size = size.max(1);
        self.selection.set_group_size(size);
    }

    pub fn set_booking_time(&mut self, starts_at: Option<DateTime<Utc>>) {
        self.form.starts_at = starts_at;
    }

    pub fn set_duration(&mut self, hours: f64) {
        self.form.duration_hours = hours;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn can_confirm(&self) -> bool {
        self.selection.can_confirm()
    }

    /// Book every selected seat as one group. On success the records are
    /// persisted, the selection resets and the confirmation summary is
    /// returned; on any validation failure nothing changes.
    pub fn confirm_booking(&mut self) -> Result<BookingSummary, SessionError> {
        let context = self.context.ok_or(SessionError::NoLocationOpen)?;
        let request = GroupBookingRequest {
            floor_id: context.floor,
            seat_ids: self.selection.selected().to_vec(),
            starts_at: self.form.starts_at,
            duration_hours: self.form.duration_hours,
            group_size: self.form.group_size,
        };
        let now = self.clock.now();
        let created = self
            .ledger
            .create_group(&mut self.catalog, context.location_id, request, now)?;
        self.persist_bookings();
        self.selection.clear();

        let group_id = created.first().map(|b| b.group_id).unwrap_or_default();
        info!(session = %self.id, group_id, "booking confirmed");
        BookingSummary::from_group(&created)
            .ok_or(SessionError::Ledger(LedgerError::GroupNotFound(group_id)))
    }

    pub fn cancel_booking(&mut self, id: BookingId) -> Result<(), SessionError> {
        self.ledger.cancel(&mut self.catalog, id)?;
        self.persist_bookings();
        Ok(())
    }

    pub fn cancel_group(&mut self, group_id: GroupId) -> Result<(), SessionError> {
        self.ledger.cancel_group(&mut self.catalog, group_id)?;
        self.persist_bookings();
        Ok(())
    }

    /// Upcoming bookings, grouped for the bookings page.
    pub fn active_bookings(&self) -> BookingsPage {
        let active = self.ledger.list_active(self.clock.now());
        BookingsPage {
            groups: active
                .groups
                .iter()
                .filter_map(|group| BookingSummary::from_group(group))
                .collect(),
            singles: active
                .singles
                .iter()
                .filter_map(|single| BookingSummary::from_group(std::slice::from_ref(single)))
                .collect(),
        }
    }

    /// How many (and which) seats are free at a location for the requested
    /// window.
    pub fn availability_for(
        &self,
        location_id: LocationId,
        date: &str,
        time: &str,
        duration_hours: f64,
    ) -> Result<AvailabilityReport, SessionError> {
        let window = TimeWindow::parse(date, time, duration_hours)?;
        let location = self
            .catalog
            .get(location_id)
            .ok_or(SessionError::UnknownLocation(location_id))?;
        let free = availability::free_seats(location, self.ledger.records(), window, self.clock.now());
        Ok(AvailabilityReport {
            location_id,
            window,
            available: free.len() as u32,
            total: location.total_seats,
            seats: free
                .into_iter()
                .map(|(floor, seat)| (floor, seat.id.clone()))
                .collect(),
        })
    }

    /// The seat map of the current view, with selection flags for the
    /// renderer.
    pub fn seat_map(&self) -> Result<SeatMapView, SessionError> {
        let context = self.context.ok_or(SessionError::NoLocationOpen)?;
        let location = self
            .catalog
            .get(context.location_id)
            .ok_or(SessionError::UnknownLocation(context.location_id))?;

        let floors: Vec<FloorView> = location.floors().iter().map(floor_view).collect();
        let (floor, seats) = match context.floor {
            Some(number) => {
                let floor = location
                    .floor(number)
                    .ok_or(SessionError::UnknownFloor {
                        location: location.id,
                        floor: number,
                    })?;
                (Some(floor_view(floor)), self.seat_views(&floor.seats))
            }
            None => {
                let seats: Vec<SeatView> = location
                    .all_seats()
                    .map(|seat| self.seat_view(seat))
                    .collect();
                (None, seats)
            }
        };

        Ok(SeatMapView {
            location_id: location.id,
            location_name: location.name.clone(),
            address: location.address.clone(),
            floor,
            floors,
            available_seats: location.available_seats,
            total_seats: location.total_seats,
            crowd_level: location.crowd_level,
            seats,
        })
    }

    pub fn is_favorite(&self, id: LocationId) -> bool {
        self.favorites.contains(&id)
    }

    /// Add or remove a favorite; returns whether the location is now
    /// favorited.
    pub fn toggle_favorite(&mut self, id: LocationId) -> Result<bool, SessionError> {
        if self.catalog.get(id).is_none() {
            return Err(SessionError::UnknownLocation(id));
        }
        let added = match self.favorites.iter().position(|f| *f == id) {
            Some(index) => {
                self.favorites.remove(index);
                false
            }
            None => {
                self.favorites.push(id);
                true
            }
        };
        store::save_favorites(self.store.as_ref(), &self.favorites);
        Ok(added)
    }

    pub fn favorite_cards(&self) -> Vec<LocationCard> {
        self.favorites
            .iter()
            .filter_map(|id| self.catalog.get(*id))
            .map(|location| self.card(location, location.available_seats, None))
            .collect()
    }

    /// One simulator tick against the owned catalog and ledger.
    pub fn simulate_tick(&mut self) -> Vec<ChurnEvent> {
        let now = self.clock.now();
        self.simulator.tick(&mut self.catalog, &self.ledger, now)
    }

    fn prefill_form(&mut self) {
        let starts_at = match (self.filters.date.as_deref(), self.filters.time.as_deref()) {
            (Some(date), Some(time)) => {
                TimeWindow::parse(date, time, self.filters.duration_hours)
                    .ok()
                    .map(|w| w.start)
            }
            _ => None,
        };
        self.form = BookingForm {
            starts_at,
            duration_hours: self.filters.duration_hours,
            group_size: self.filters.pax.max(1),
        };
        self.selection = SeatSelection::new(self.form.group_size);
    }

    fn card(
        &self,
        location: &Location,
        available_seats: u32,
        search_window: Option<TimeWindow>,
    ) -> LocationCard {
        let distance_km = match (self.user_location, location.coordinates) {
            (Some(here), Some(there)) => Some(search::haversine_km(here, there)),
            _ => None,
        };
        LocationCard {
            id: location.id,
            name: location.name.clone(),
            kind: location.kind.clone(),
            address: location.address.clone(),
            region: location.region.clone(),
            available_seats,
            total_seats: location.total_seats,
            crowd_level: location.crowd_level,
            facilities: location.facilities.clone(),
            is_favorite: self.favorites.contains(&location.id),
            distance_km,
            search_window,
        }
    }

    fn seat_view(&self, seat: &Seat) -> SeatView {
        SeatView {
            id: seat.id.clone(),
            seat_type: seat.seat_type,
            position: seat.position,
            status: seat.status,
            selected: self.selection.is_selected(&seat.id),
        }
    }

    fn seat_views(&self, seats: &[Seat]) -> Vec<SeatView> {
        seats.iter().map(|seat| self.seat_view(seat)).collect()
    }

    /// Mark the seats of still-live stored bookings occupied so a reloaded
    /// session shows the same map it persisted, then derive every count.
    fn rehydrate(&mut self) {
        let now = self.clock.now();
        let live: Vec<(LocationId, Option<FloorNumber>, SeatId)> = self
            .ledger
            .records()
            .iter()
            .filter(|b| b.is_live(now))
            .map(|b| (b.location_id, b.floor_id, b.seat_id.clone()))
            .collect();
        for (location_id, floor, seat_id) in live {
            if let Some(location) = self.catalog.get_mut(location_id) {
                if let Some(seat) = location.seat_mut(floor, &seat_id) {
                    seat.status = SeatStatus::Occupied;
                }
            }
        }
        for location in self.catalog.locations_mut() {
            location.recompute_counts();
        }
    }

    fn persist_bookings(&self) {
        store::save_bookings(self.store.as_ref(), self.ledger.records());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no location is open")]
    NoLocationOpen,

    #[error("unknown location: {0}")]
    UnknownLocation(LocationId),

    #[error("unknown floor {floor} at location {location}")]
    UnknownFloor {
        location: LocationId,
        floor: FloorNumber,
    },

    #[error("unknown seat: {0}")]
    UnknownSeat(SeatId),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    InvalidWindow(#[from] InvalidTimeWindow),
}

fn floor_view(floor: &Floor) -> FloorView {
    FloorView {
        floor_number: floor.floor_number,
        floor_name: floor.floor_name.clone(),
        description: floor.description.clone(),
        available_seats: floor.available_seats,
        total_seats: floor.total_seats,
    }
}
