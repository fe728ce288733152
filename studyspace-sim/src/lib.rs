pub mod churn;

pub use churn::{ChurnEvent, OccupancySimulator, DEFAULT_CHURN_PROBABILITY};
