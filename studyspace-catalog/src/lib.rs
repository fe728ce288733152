pub mod location;
pub mod search;

pub use location::{
    Catalog, CatalogError, Coordinates, CrowdLevel, Floor, FloorNumber, Location, LocationId,
    Seat, SeatId, SeatPlan, SeatPosition, SeatStatus, SeatType,
};
pub use search::{CategoryCounts, LocationCategory, SearchFilters, SortOrder};
