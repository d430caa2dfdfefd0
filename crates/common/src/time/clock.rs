//! Trait for wall-clock time so schedule resolution can be tested at fixed
//! instants.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use pbxpresence_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
//! clock.advance(Duration::minutes(30));
//! assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Start the clock at `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(instant)) }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock() = instant;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn mock_clock_clones_share_time() {
        let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
        let other = clock.clone();
        clock.advance(Duration::hours(2));
        assert_eq!(other.now(), Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap());

        other.set(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn arc_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(MockClock::at(Utc.timestamp_opt(0, 0).unwrap()));
        assert_eq!(clock.now().timestamp(), 0);
    }
}
