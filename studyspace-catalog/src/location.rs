use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type LocationId = u32;
pub type FloorNumber = u32;

/// Canonical seat identifier. Seed data carries plain numbers for some
/// locations and labels like `"S52"` for others; both normalize to a string.
/// Seat identity for booking purposes is always the composite
/// `(location id, floor number or none, seat id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeatId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for SeatId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Label(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => SeatId(n.to_string()),
            Raw::Label(s) => SeatId(s),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Occupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatType {
    Power,
    Window,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatPosition {
    Corner,
    Center,
    Wall,
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    #[serde(rename = "type")]
    pub seat_type: SeatType,
    pub position: SeatPosition,
    pub status: SeatStatus,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub floor_number: FloorNumber,
    pub floor_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub layout_type: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub total_seats: u32,
    #[serde(default)]
    pub available_seats: u32,
    pub seats: Vec<Seat>,
}

/// The seats of a location: one flat list, or one list per floor.
#[derive(Debug, Clone)]
pub enum SeatPlan {
    Flat(Vec<Seat>),
    Floored(Vec<Floor>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Derived occupancy classification shown on location cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdLevel {
    Low,
    Moderate,
    High,
}

impl CrowdLevel {
    /// Classify the occupancy rate `(total - available) / total`.
    /// Thresholds are on occupancy, not availability.
    pub fn from_counts(available: u32, total: u32) -> Self {
        if total == 0 {
            return CrowdLevel::Low;
        }
        let occupancy = f64::from(total - available) / f64::from(total);
        if occupancy < 0.4 {
            CrowdLevel::Low
        } else if occupancy < 0.7 {
            CrowdLevel::Moderate
        } else {
            CrowdLevel::High
        }
    }
}

impl fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrowdLevel::Low => "low",
            CrowdLevel::Moderate => "moderate",
            CrowdLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// A bookable study location. `total_seats`, `available_seats` and
/// `crowd_level` are derived from the seat plan by `recompute_counts` and are
/// never maintained independently of it; the counts a seed file declares are
/// discarded on load.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: String,
    pub address: String,
    pub region: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub facilities: Vec<String>,
    pub image: Option<String>,
    pub total_seats: u32,
    pub available_seats: u32,
    pub crowd_level: CrowdLevel,
    pub plan: SeatPlan,
}

/// Seed-file shape: `hasFloors` selects which of `seats` / `floors` is
/// populated.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    id: LocationId,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    #[serde(default)]
    facilities: Vec<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    has_floors: bool,
    #[serde(default)]
    floors: Option<Vec<Floor>>,
    #[serde(default)]
    seats: Option<Vec<Seat>>,
}

impl TryFrom<RawLocation> for Location {
    type Error = CatalogError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let plan = if raw.has_floors {
            SeatPlan::Floored(raw.floors.ok_or(CatalogError::MissingFloors(raw.id))?)
        } else {
            SeatPlan::Flat(raw.seats.ok_or(CatalogError::MissingSeats(raw.id))?)
        };

        let mut location = Location {
            id: raw.id,
            name: raw.name,
            kind: raw.kind,
            address: raw.address,
            region: raw.region,
            coordinates: raw.coordinates,
            facilities: raw.facilities,
            image: raw.image,
            total_seats: 0,
            available_seats: 0,
            crowd_level: CrowdLevel::Low,
            plan,
        };
        location.validate_seat_ids()?;
        location.recompute_counts();
        Ok(location)
    }
}

impl Location {
    pub fn has_floors(&self) -> bool {
        matches!(self.plan, SeatPlan::Floored(_))
    }

    pub fn floors(&self) -> &[Floor] {
        match &self.plan {
            SeatPlan::Floored(floors) => floors,
            SeatPlan::Flat(_) => &[],
        }
    }

    pub fn floor(&self, number: FloorNumber) -> Option<&Floor> {
        self.floors().iter().find(|f| f.floor_number == number)
    }

    /// Every seat of the location regardless of plan shape.
    pub fn all_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats_with_floor().map(|(_, seat)| seat)
    }

    /// Every seat paired with its floor number (`None` for flat locations).
    pub fn seats_with_floor(&self) -> impl Iterator<Item = (Option<FloorNumber>, &Seat)> {
        let (flat, floored) = match &self.plan {
            SeatPlan::Flat(seats) => (Some(seats), None),
            SeatPlan::Floored(floors) => (None, Some(floors)),
        };
        flat.into_iter()
            .flatten()
            .map(|seat| (None, seat))
            .chain(floored.into_iter().flatten().flat_map(|floor| {
                floor
                    .seats
                    .iter()
                    .map(move |seat| (Some(floor.floor_number), seat))
            }))
    }

    /// Look up a seat by composite key. Floored locations require the floor
    /// number; per-floor numbering may repeat across floors.
    pub fn seat(&self, floor: Option<FloorNumber>, id: &SeatId) -> Option<&Seat> {
        match &self.plan {
            SeatPlan::Flat(seats) => seats.iter().find(|s| &s.id == id),
            SeatPlan::Floored(_) => self
                .floor(floor?)?
                .seats
                .iter()
                .find(|s| &s.id == id),
        }
    }

    pub fn seat_mut(&mut self, floor: Option<FloorNumber>, id: &SeatId) -> Option<&mut Seat> {
        match &mut self.plan {
            SeatPlan::Flat(seats) => seats.iter_mut().find(|s| &s.id == id),
            SeatPlan::Floored(floors) => floors
                .iter_mut()
                .find(|f| Some(f.floor_number) == floor)?
                .seats
                .iter_mut()
                .find(|s| &s.id == id),
        }
    }

    /// Recompute every derived field from the seat lists. Called after any
    /// seat-status mutation; the counts are never incremented in place.
    pub fn recompute_counts(&mut self) {
        match &mut self.plan {
            SeatPlan::Flat(seats) => {
                self.total_seats = seats.len() as u32;
                self.available_seats = seats.iter().filter(|s| s.is_available()).count() as u32;
            }
            SeatPlan::Floored(floors) => {
                self.total_seats = 0;
                self.available_seats = 0;
                for floor in floors.iter_mut() {
                    floor.total_seats = floor.seats.len() as u32;
                    floor.available_seats =
                        floor.seats.iter().filter(|s| s.is_available()).count() as u32;
                    self.total_seats += floor.total_seats;
                    self.available_seats += floor.available_seats;
                }
            }
        }
        self.crowd_level = CrowdLevel::from_counts(self.available_seats, self.total_seats);
    }

    fn validate_seat_ids(&self) -> Result<(), CatalogError> {
        match &self.plan {
            SeatPlan::Flat(seats) => check_unique(self.id, None, seats)?,
            SeatPlan::Floored(floors) => {
                for floor in floors {
                    check_unique(self.id, Some(floor.floor_number), &floor.seats)?;
                }
            }
        }
        Ok(())
    }
}

fn check_unique(
    location: LocationId,
    floor: Option<FloorNumber>,
    seats: &[Seat],
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for seat in seats {
        if !seen.insert(&seat.id) {
            return Err(CatalogError::DuplicateSeatId {
                location,
                floor,
                seat: seat.id.to_string(),
            });
        }
    }
    Ok(())
}

/// The full location catalog supplied at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locations: Vec<Location>,
}

impl Catalog {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let locations: Vec<Location> = serde_json::from_str(json)?;
        Ok(Self { locations })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.id == id)
    }

    pub fn locations_mut(&mut self) -> &mut [Location] {
        &mut self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("location {0} has hasFloors=false but no seat list")]
    MissingSeats(LocationId),

    #[error("location {0} has hasFloors=true but no floor list")]
    MissingFloors(LocationId),

    #[error("duplicate seat id {seat} in location {location} (floor {floor:?})")]
    DuplicateSeatId {
        location: LocationId,
        floor: Option<FloorNumber>,
        seat: String,
    },
}
