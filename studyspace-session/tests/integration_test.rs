use std::sync::Arc;
use studyspace_booking::SeatToggle;
use studyspace_catalog::{Catalog, CrowdLevel, SearchFilters, SeatId};
use studyspace_session::{SessionError, StudySession};
use studyspace_shared::window::parse_instant;
use studyspace_shared::{Clock, ManualClock};
use studyspace_store::{KvStore, MemoryStore};

const SEED: &str = r#"[
    {
        "id": 1, "name": "Bedok Public Library", "type": "Public Library",
        "address": "11 Bedok North Street 1", "region": "East",
        "coordinates": { "lat": 1.3244, "lng": 103.9365 },
        "facilities": ["wifi", "quiet", "power"],
        "seats": [
            { "id": 1, "type": "power", "position": "corner", "status": "available" },
            { "id": 2, "type": "window", "position": "window", "status": "available" },
            { "id": 3, "type": "regular", "position": "center", "status": "available" },
            { "id": 4, "type": "regular", "position": "wall", "status": "available" }
        ]
    },
    {
        "id": 2, "name": "Sengkang Public Library", "type": "Public Library",
        "address": "1 Sengkang Square", "region": "North-East",
        "facilities": ["wifi"],
        "seats": [
            { "id": 1, "type": "regular", "position": "center", "status": "available" }
        ]
    },
    {
        "id": 5, "name": "Woodlands Regional Library", "type": "Regional Library",
        "address": "900 South Woodlands Drive", "region": "North",
        "facilities": ["quiet", "group", "wifi"],
        "hasFloors": true,
        "floors": [
            { "floorNumber": 1, "floorName": "Level 1 - General Collection", "seats": [
                { "id": "S51", "type": "power", "position": "corner", "status": "available" },
                { "id": "S52", "type": "regular", "position": "center", "status": "available" }
            ]},
            { "floorNumber": 2, "floorName": "Level 2 - Quiet Zone", "seats": [
                { "id": "S51", "type": "window", "position": "window", "status": "available" },
                { "id": "S53", "type": "regular", "position": "wall", "status": "available" }
            ]}
        ]
    }
]"#;

fn seed_catalog() -> Catalog {
    Catalog::from_json(SEED).unwrap()
}

fn session_at(start: &str, store: Arc<dyn KvStore>) -> (StudySession, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(parse_instant(start).unwrap()));
    let session = StudySession::new(seed_catalog(), store, clock.clone() as Arc<dyn Clock>);
    (session, clock)
}

#[test]
fn test_search_open_select_confirm_and_cancel_group() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    // Search for a 2pm slot for three people; look-ahead equals live counts
    // while nothing is booked.
    let filters = SearchFilters {
        text: Some("bedok".into()),
        date: Some("2025-06-01".into()),
        time: Some("14:00".into()),
        duration_hours: 2.0,
        pax: 3,
        ..Default::default()
    };
    let cards = session.search(filters).unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].available_seats, 4);
    assert!(cards[0].search_window.is_some());

    // Opening the location pre-fills the form from the search.
    session.open_location(1).unwrap();
    assert_eq!(session.booking_form().group_size, 3);
    assert_eq!(
        session.booking_form().starts_at,
        Some(parse_instant("2025-06-01T14:00").unwrap())
    );

    // Pick three seats, then a fourth: the oldest pick makes way.
    for seat in [1u32, 2, 3] {
        session.select_seat(&SeatId::from(seat)).unwrap();
    }
    assert!(session.can_confirm());
    let toggle = session.select_seat(&SeatId::from(4)).unwrap();
    assert_eq!(
        toggle,
        SeatToggle::Replaced {
            evicted: SeatId::from(1)
        }
    );
    assert_eq!(
        session.selection().selected(),
        &[SeatId::from(2), SeatId::from(3), SeatId::from(4)]
    );

    let summary = session.confirm_booking().unwrap();
    assert_eq!(summary.group_size, 3);
    assert_eq!(summary.seats.len(), 3);
    assert_eq!(summary.ends_at, parse_instant("2025-06-01T16:00").unwrap());

    // Selection resets, seats flip occupied, counts and crowd level follow.
    assert!(session.selection().is_empty());
    let location = session.catalog().get(1).unwrap();
    assert_eq!(location.available_seats, 1);
    assert_eq!(location.crowd_level, CrowdLevel::High);

    let page = session.active_bookings();
    assert_eq!(page.groups.len(), 1);
    assert!(page.singles.is_empty());

    // Cancelling the group restores the pre-booking state exactly.
    session.cancel_group(summary.group_id).unwrap();
    let location = session.catalog().get(1).unwrap();
    assert_eq!(location.available_seats, 4);
    assert_eq!(location.crowd_level, CrowdLevel::Low);
    assert!(session.ledger().is_empty());
    assert!(session.active_bookings().groups.is_empty());
}

#[test]
fn test_availability_engine_scenario_on_single_seat_location() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    session.search(SearchFilters::default()).unwrap();
    session.open_location(2).unwrap();
    session.set_group_size(1);
    session.set_booking_time(Some(parse_instant("2025-06-01T10:00").unwrap()));
    session.set_duration(2.0);
    session.select_seat(&SeatId::from(1)).unwrap();
    let summary = session.confirm_booking().unwrap();

    // Overlapping hour: nothing free. Back-to-back at noon: free again.
    let overlap = session
        .availability_for(2, "2025-06-01", "11:00", 1.0)
        .unwrap();
    assert_eq!(overlap.available, 0);
    let adjacent = session
        .availability_for(2, "2025-06-01", "12:00", 1.0)
        .unwrap();
    assert_eq!(adjacent.available, 1);

    // A window starting at "now" consults live status: the seat is already
    // marked occupied by the booking even before 10:00.
    let immediate = session
        .availability_for(2, "2025-06-01", "09:00", 1.0)
        .unwrap();
    assert_eq!(immediate.available, 0);

    session.cancel_booking(summary.seats[0].booking_id).unwrap();
    let location = session.catalog().get(2).unwrap();
    assert_eq!(location.available_seats, 1);
    assert!(location
        .seat(None, &SeatId::from(1))
        .unwrap()
        .is_available());
}

#[test]
fn test_malformed_search_datetime_is_rejected_not_available() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    let filters = SearchFilters {
        date: Some("yesterday".into()),
        time: Some("10:00".into()),
        ..Default::default()
    };
    assert!(matches!(
        session.search(filters),
        Err(SessionError::InvalidWindow(_))
    ));
    assert!(session
        .availability_for(1, "2025-06-01", "26:00", 1.0)
        .is_err());
}

#[test]
fn test_floor_switch_clears_selection_and_keys_bookings_by_floor() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    let map = session.open_location(5).unwrap();
    assert_eq!(map.floor.as_ref().map(|f| f.floor_number), Some(1));
    assert_eq!(map.floors.len(), 2);

    session.set_group_size(1);
    session.select_seat(&SeatId::from("S51")).unwrap();
    assert!(session.can_confirm());

    // Switching floors drops the level 1 selection entirely.
    let map = session.select_floor(2).unwrap();
    assert!(session.selection().is_empty());
    assert!(map.seats.iter().all(|s| !s.selected));

    session.set_booking_time(Some(parse_instant("2025-06-01T10:00").unwrap()));
    session.select_seat(&SeatId::from("S51")).unwrap();
    let summary = session.confirm_booking().unwrap();
    assert_eq!(summary.location_name, "Woodlands Regional Library - Level 2 - Quiet Zone");

    // Only level 2's S51 is taken; level 1 reuses the number freely.
    let location = session.catalog().get(5).unwrap();
    assert!(!location
        .seat(Some(2), &SeatId::from("S51"))
        .unwrap()
        .is_available());
    assert!(location
        .seat(Some(1), &SeatId::from("S51"))
        .unwrap()
        .is_available());
    assert_eq!(location.available_seats, 3);
    assert_eq!(
        location.available_seats,
        location.floors().iter().map(|f| f.available_seats).sum::<u32>()
    );
}

#[test]
fn test_occupied_seats_cannot_be_selected() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    session.open_location(2).unwrap();
    session.set_group_size(1);
    session.set_booking_time(Some(parse_instant("2025-06-01T10:00").unwrap()));
    session.select_seat(&SeatId::from(1)).unwrap();
    session.confirm_booking().unwrap();

    assert!(matches!(
        session.select_seat(&SeatId::from(1)),
        Err(SessionError::Selection(_))
    ));
}

#[test]
fn test_confirm_without_time_reports_missing_time_and_changes_nothing() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (mut session, _clock) = session_at("2025-06-01T09:00", store);

    session.open_location(1).unwrap();
    session.set_group_size(1);
    session.set_booking_time(None);
    session.select_seat(&SeatId::from(1)).unwrap();

    assert!(session.confirm_booking().is_err());
    assert!(session.ledger().is_empty());
    assert_eq!(session.catalog().get(1).unwrap().available_seats, 4);
    // The selection survives a rejected confirm so the user can retry.
    assert!(session.can_confirm());
}

#[test]
fn test_bookings_and_favorites_persist_across_sessions() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    let group_id = {
        let (mut session, _clock) = session_at("2025-06-01T09:00", store.clone());
        session.open_location(1).unwrap();
        session.set_group_size(2);
        session.set_booking_time(Some(parse_instant("2025-06-01T15:00").unwrap()));
        session.select_seat(&SeatId::from(1)).unwrap();
        session.select_seat(&SeatId::from(2)).unwrap();
        let summary = session.confirm_booking().unwrap();
        session.toggle_favorite(5).unwrap();
        summary.group_id
    };

    // A fresh session over the same store sees the booking, re-marks the
    // seats on the pristine seed catalog and keeps the favorite.
    let (mut session, _clock) = session_at("2025-06-01T10:00", store.clone());
    assert_eq!(session.ledger().len(), 2);
    assert!(session.is_favorite(5));

    let location = session.catalog().get(1).unwrap();
    assert_eq!(location.available_seats, 2);
    assert!(!location.seat(None, &SeatId::from(1)).unwrap().is_available());

    let page = session.active_bookings();
    assert_eq!(page.groups.len(), 1);
    assert_eq!(page.groups[0].group_id, group_id);

    session.cancel_group(group_id).unwrap();
    assert!(session.ledger().is_empty());

    // And the cancellation is durable too.
    let (session, _clock) = session_at("2025-06-01T11:00", store);
    assert!(session.ledger().is_empty());
    assert_eq!(session.catalog().get(1).unwrap().available_seats, 4);
}

#[test]
fn test_expired_bookings_do_not_rehydrate_occupancy() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    {
        let (mut session, _clock) = session_at("2025-06-01T09:00", store.clone());
        session.open_location(2).unwrap();
        session.set_group_size(1);
        session.set_booking_time(Some(parse_instant("2025-06-01T10:00").unwrap()));
        session.select_seat(&SeatId::from(1)).unwrap();
        session.confirm_booking().unwrap();
    }

    // Two days later the stored record is history: the seat comes back free
    // and the booking no longer lists as upcoming.
    let (session, _clock) = session_at("2025-06-03T09:00", store);
    assert_eq!(session.ledger().len(), 1);
    let location = session.catalog().get(2).unwrap();
    assert!(location.seat(None, &SeatId::from(1)).unwrap().is_available());
    assert!(session.active_bookings().groups.is_empty());
    assert!(session.active_bookings().singles.is_empty());
}

#[test]
fn test_simulator_tick_respects_live_bookings_in_session() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use studyspace_sim::OccupancySimulator;

    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let (session, _clock) = session_at("2025-06-01T09:00", store);
    let mut session =
        session.with_simulator(OccupancySimulator::with_rng(StdRng::seed_from_u64(42), 1.0));

    session.open_location(2).unwrap();
    session.set_group_size(1);
    session.set_booking_time(Some(parse_instant("2025-06-01T09:30").unwrap()));
    session.select_seat(&SeatId::from(1)).unwrap();
    session.confirm_booking().unwrap();

    for _ in 0..50 {
        session.simulate_tick();
        // The booked seat stays pinned while its window is live.
        let location = session.catalog().get(2).unwrap();
        assert!(!location.seat(None, &SeatId::from(1)).unwrap().is_available());
        // Conservation holds everywhere, and floored locations never churn.
        for location in session.catalog().locations() {
            let occupied = location.all_seats().filter(|s| !s.is_available()).count() as u32;
            assert_eq!(location.available_seats + occupied, location.total_seats);
        }
        let floored = session.catalog().get(5).unwrap();
        assert_eq!(floored.available_seats, 4);
    }
}
