use crate::session::StudySession;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Drive the occupancy simulator on a fixed wall-clock interval.
///
/// The session is locked only for the duration of each tick; user-facing
/// operations serialize against the same mutex, which is the single critical
/// section the booking invariants need when the core runs on more than one
/// task.
pub async fn run_occupancy_worker(session: Arc<Mutex<StudySession>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick of a tokio interval fires immediately; consume it so
    // churn starts one full interval after startup.
    ticker.tick().await;

    info!(interval_secs = interval.as_secs(), "occupancy worker started");
    loop {
        ticker.tick().await;
        match session.lock() {
            Ok(mut session) => {
                let events = session.simulate_tick();
                if !events.is_empty() {
                    info!(flips = events.len(), "applied occupancy churn");
                }
            }
            Err(err) => {
                warn!(%err, "session mutex poisoned, stopping occupancy worker");
                return;
            }
        }
    }
}
