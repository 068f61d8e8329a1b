//! Time source abstraction
//!
//! Purchase and return timestamps are server-assigned, and the return window
//! check compares against the current time. Injecting the clock keeps the
//! window policy testable and makes CSV replay deterministic.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of the current time for timestamp assignment and window checks
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, used in live runs
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Externally-driven clock for tests and replay
///
/// Time only moves when `set` or `advance` is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(now),
        }
    }

    /// Jump the clock to the given instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock forward by the given duration
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_is_frozen_until_moved() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn manual_clock_advance_moves_forward() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);

        clock.advance(Duration::minutes(2));
        assert_eq!(clock.now(), start + Duration::minutes(2));
    }

    #[test]
    fn manual_clock_set_jumps() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 13, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);

        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
