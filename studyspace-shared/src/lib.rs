pub mod clock;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use window::{InvalidTimeWindow, TimeWindow};
