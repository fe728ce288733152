use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use studyspace_booking::BookingLedger;
use studyspace_catalog::{Catalog, Location, LocationId, SeatId, SeatPlan, SeatStatus};
use tracing::debug;

pub const DEFAULT_CHURN_PROBABILITY: f64 = 0.3;

/// One seat flip applied by a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurnEvent {
    pub location_id: LocationId,
    pub seat_id: SeatId,
    pub status: SeatStatus,
}

/// Walk-in/walk-out churn applied on a timer to flat locations. Floored
/// locations are excluded; their seats change only through explicit booking
/// and cancel operations. A seat with a live booking is never freed: the
/// ledger is authoritative over simulated occupancy.
#[derive(Debug)]
pub struct OccupancySimulator<R: Rng = StdRng> {
    rng: R,
    probability: f64,
}

impl OccupancySimulator<StdRng> {
    pub fn new(probability: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), probability)
    }
}

impl Default for OccupancySimulator<StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_CHURN_PROBABILITY)
    }
}

impl<R: Rng> OccupancySimulator<R> {
    /// Injectable randomness so tests can drive deterministic ticks.
    pub fn with_rng(rng: R, probability: f64) -> Self {
        Self { rng, probability }
    }

    /// One tick over every flat location. Each location churns independently
    /// with the configured probability: a coin flip then picks between
    /// occupying one random free seat and freeing one random occupied seat
    /// without a live booking. Derived counts are recomputed after each flip.
    pub fn tick(
        &mut self,
        catalog: &mut Catalog,
        ledger: &BookingLedger,
        now: DateTime<Utc>,
    ) -> Vec<ChurnEvent> {
        let flat_ids: Vec<LocationId> = catalog
            .locations()
            .iter()
            .filter(|l| !l.has_floors())
            .map(|l| l.id)
            .collect();

        let mut events = Vec::new();
        for id in flat_ids {
            if self.rng.gen::<f64>() >= self.probability {
                continue;
            }
            let Some(location) = catalog.get_mut(id) else {
                continue;
            };
            let event = if self.rng.gen_bool(0.5) {
                // No free seat to take falls through to the free branch,
                // matching the observed churn distribution.
                occupy_random(location, &mut self.rng)
                    .or_else(|| free_random(location, ledger, now, &mut self.rng))
            } else {
                free_random(location, ledger, now, &mut self.rng)
            };
            if let Some(event) = event {
                location.recompute_counts();
                debug!(
                    location = event.location_id,
                    seat = %event.seat_id,
                    status = ?event.status,
                    "occupancy churn"
                );
                events.push(event);
            }
        }
        events
    }
}

fn occupy_random<R: Rng>(location: &mut Location, rng: &mut R) -> Option<ChurnEvent> {
    let candidates: Vec<SeatId> = match &location.plan {
        SeatPlan::Flat(seats) => seats
            .iter()
            .filter(|s| s.is_available())
            .map(|s| s.id.clone())
            .collect(),
        SeatPlan::Floored(_) => return None,
    };
    let pick = candidates.choose(rng)?.clone();
    location.seat_mut(None, &pick)?.status = SeatStatus::Occupied;
    Some(ChurnEvent {
        location_id: location.id,
        seat_id: pick,
        status: SeatStatus::Occupied,
    })
}

fn free_random<R: Rng>(
    location: &mut Location,
    ledger: &BookingLedger,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<ChurnEvent> {
    let candidates: Vec<SeatId> = match &location.plan {
        SeatPlan::Flat(seats) => seats
            .iter()
            .filter(|s| !s.is_available())
            .filter(|s| !ledger.has_live_booking(location.id, None, &s.id, now))
            .map(|s| s.id.clone())
            .collect(),
        SeatPlan::Floored(_) => return None,
    };
    let pick = candidates.choose(rng)?.clone();
    location.seat_mut(None, &pick)?.status = SeatStatus::Available;
    Some(ChurnEvent {
        location_id: location.id,
        seat_id: pick,
        status: SeatStatus::Available,
    })
}
