//! Timers and durations.

pub use std::time::{Duration, Instant};
pub use tokio::time::{error::Elapsed, interval, sleep, timeout, Interval, Sleep};
