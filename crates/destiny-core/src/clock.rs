//! Wall-clock time for room expiry, session records and epitaphs.

use chrono::{DateTime, Utc};

/// Where the engine reads "now". Tests pin it with a fixed instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the host's UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
