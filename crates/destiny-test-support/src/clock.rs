//! A pinned clock so room expiry and epitaph dates are predictable.

use chrono::{DateTime, TimeZone, Utc};
use destiny_core::clock::Clock;

/// Always reports the instant it was built with.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to a UTC calendar time.
    ///
    /// # Panics
    ///
    /// Panics if the fields do not name a valid instant.
    #[must_use]
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
                .single()
                .expect("FixedClock::at needs a valid UTC time"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
