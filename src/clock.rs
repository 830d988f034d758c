//! Injectable time source.
//!
//! The lockout policy and counter store never call `Utc::now()` directly;
//! they take the current time from a [`Clock`] owned by the guard. Tests
//! swap in [`MockClock`] to drive window expiry and lockout timeouts
//! without sleeping.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Starts at a fixed instant and only moves when `advance` is called.
#[cfg(test)]
pub(crate) struct MockClock {
    now: parking_lot::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl MockClock {
    pub(crate) fn new() -> Self {
        use chrono::TimeZone;
        Self {
            now: parking_lot::Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    pub(crate) fn advance(&self, duration: std::time::Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(duration).expect("duration out of range");
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
    }

    #[test]
    fn test_mock_clock_is_fixed_until_advanced() {
        let clock = MockClock::new();
        let t1 = clock.now();
        assert_eq!(clock.now(), t1);

        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now(), t1 + chrono::Duration::seconds(60));
    }
}
