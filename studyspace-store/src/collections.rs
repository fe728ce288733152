use crate::kv::KvStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use studyspace_booking::Booking;
use studyspace_catalog::LocationId;
use tracing::warn;

pub const BOOKINGS_KEY: &str = "studyspace-bookings";
pub const FAVORITES_KEY: &str = "studyspace-favorites";

/// Read the persisted booking records. Missing or corrupt storage falls back
/// to an empty ledger rather than failing the session.
pub fn load_bookings(store: &dyn KvStore) -> Vec<Booking> {
    load(store, BOOKINGS_KEY)
}

pub fn save_bookings(store: &dyn KvStore, bookings: &[Booking]) {
    save(store, BOOKINGS_KEY, bookings)
}

/// Read the persisted favorite location ids.
pub fn load_favorites(store: &dyn KvStore) -> Vec<LocationId> {
    load(store, FAVORITES_KEY)
}

pub fn save_favorites(store: &dyn KvStore, favorites: &[LocationId]) {
    save(store, FAVORITES_KEY, favorites)
}

fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Vec<T> {
    let Some(text) = store.read(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&text) {
        Ok(values) => values,
        Err(err) => {
            warn!(%err, key, "discarding corrupt stored collection");
            Vec::new()
        }
    }
}

fn save<T: Serialize>(store: &dyn KvStore, key: &str, values: &[T]) {
    match serde_json::to_string(values) {
        Ok(text) => store.write(key, &text),
        Err(err) => warn!(%err, key, "failed to serialize stored collection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use studyspace_booking::Booking;
    use studyspace_catalog::{SeatId, SeatPosition, SeatType};
    use studyspace_shared::window::parse_instant;

    fn booking() -> Booking {
        Booking {
            id: 1748800000000,
            group_id: 1748800000000,
            group_size: 1,
            group_index: 1,
            location_id: 1,
            location_name: "Bedok Public Library".into(),
            floor_id: None,
            seat_id: SeatId::from(1),
            seat_type: SeatType::Regular,
            seat_position: SeatPosition::Center,
            date_time: parse_instant("2025-06-01T10:00").unwrap(),
            duration: 2.0,
            booked_at: parse_instant("2025-05-30T09:00").unwrap(),
        }
    }

    #[test]
    fn test_bookings_round_trip() {
        let store = MemoryStore::new();
        save_bookings(&store, &[booking()]);
        let loaded = load_bookings(&store);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 1748800000000);
        assert_eq!(loaded[0].seat_id, SeatId::from(1));
    }

    #[test]
    fn test_missing_collections_are_empty() {
        let store = MemoryStore::new();
        assert!(load_bookings(&store).is_empty());
        assert!(load_favorites(&store).is_empty());
    }

    #[test]
    fn test_corrupt_collections_fall_back_to_empty() {
        let store = MemoryStore::new();
        store.write(BOOKINGS_KEY, "{ not json ]");
        store.write(FAVORITES_KEY, "\"also wrong shape\"");
        assert!(load_bookings(&store).is_empty());
        assert!(load_favorites(&store).is_empty());
    }

    #[test]
    fn test_favorites_round_trip() {
        let store = MemoryStore::new();
        save_favorites(&store, &[5, 2, 9]);
        assert_eq!(load_favorites(&store), vec![5, 2, 9]);
    }
}
