use crate::location::{Catalog, Coordinates, Location};
use serde::{Deserialize, Serialize};

/// Coarse location grouping used by the type filter chips, mapped onto the
/// free-form type labels carried by the seed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Library,
    University,
    Community,
}

impl LocationCategory {
    pub fn type_labels(self) -> &'static [&'static str] {
        match self {
            LocationCategory::Library => {
                &["Public Library", "Regional Library", "Reference Library"]
            }
            LocationCategory::University => &[
                "University Library",
                "Arts Institution Library",
                "International University Library",
            ],
            LocationCategory::Community => &["Community Centre"],
        }
    }

    pub fn matches(self, location: &Location) -> bool {
        self.type_labels().contains(&location.kind.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Default,
    Alphabetical,
    Availability,
    Distance,
}

/// Discovery criteria. `date`, `time`, `duration_hours` and `pax` pre-fill
/// the booking form and drive the availability look-ahead; the rest narrow
/// and order the listing. Date and time stay raw strings here and are
/// validated where a time window is actually built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    pub text: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_hours: f64,
    pub pax: u32,
    pub region: Option<String>,
    pub category: Option<LocationCategory>,
    pub facilities: Vec<String>,
    pub sort: SortOrder,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            text: None,
            date: None,
            time: None,
            duration_hours: 2.0,
            pax: 1,
            region: None,
            category: None,
            facilities: Vec::new(),
            sort: SortOrder::Default,
        }
    }
}

/// Case-insensitive match against name, type label and address.
pub fn matches_text(location: &Location, query: &str) -> bool {
    let query = query.to_lowercase();
    location.name.to_lowercase().contains(&query)
        || location.kind.to_lowercase().contains(&query)
        || location.address.to_lowercase().contains(&query)
}

/// Every requested facility must be present.
pub fn has_facilities(location: &Location, required: &[String]) -> bool {
    required
        .iter()
        .all(|facility| location.facilities.iter().any(|f| f == facility))
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Filter and order the catalog. Distance ordering needs a user position;
/// without one the incoming order is kept.
pub fn search<'a>(
    catalog: &'a Catalog,
    filters: &SearchFilters,
    user_location: Option<Coordinates>,
) -> Vec<&'a Location> {
    let mut results: Vec<&Location> = catalog
        .locations()
        .iter()
        .filter(|location| {
            filters
                .text
                .as_deref()
                .map_or(true, |q| matches_text(location, q))
        })
        .filter(|location| {
            filters
                .region
                .as_deref()
                .map_or(true, |r| location.region.as_deref() == Some(r))
        })
        .filter(|location| filters.category.map_or(true, |c| c.matches(location)))
        .filter(|location| has_facilities(location, &filters.facilities))
        .collect();

    sort_locations(&mut results, filters.sort, user_location);
    results
}

pub fn sort_locations(results: &mut [&Location], order: SortOrder, user_location: Option<Coordinates>) {
    match order {
        SortOrder::Default => {}
        SortOrder::Alphabetical => results.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Availability => {
            results.sort_by(|a, b| b.available_seats.cmp(&a.available_seats))
        }
        SortOrder::Distance => {
            if let Some(here) = user_location {
                results.sort_by(|a, b| {
                    let da = a.coordinates.map(|c| haversine_km(here, c));
                    let db = b.coordinates.map(|c| haversine_km(here, c));
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
    }
}

/// Listing counts for the type filter chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub all: usize,
    pub library: usize,
    pub university: usize,
    pub community: usize,
}

pub fn category_counts(catalog: &Catalog) -> CategoryCounts {
    let count = |category: LocationCategory| {
        catalog
            .locations()
            .iter()
            .filter(|l| category.matches(l))
            .count()
    };
    CategoryCounts {
        all: catalog.len(),
        library: count(LocationCategory::Library),
        university: count(LocationCategory::University),
        community: count(LocationCategory::Community),
    }
}
