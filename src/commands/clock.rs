//! Clock Sources
//!
//! The command processor never calls the system clock directly. It asks a
//! [`Clock`] for the current instant, which lets tests pin the time and
//! assert on exact responses.

use chrono::{DateTime, FixedOffset, Local};

/// A source of the current date and time, including its UTC offset.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant in the clock's time zone.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The local system clock, in the machine's configured time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_stable() {
        let instant = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 15, 4, 5)
            .unwrap();
        let clock = FixedClock::new(instant);

        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_uses_local_offset() {
        let now = SystemClock.now();
        let local = Local::now();

        assert_eq!(now.offset().local_minus_utc(), local.offset().local_minus_utc());
        assert!((local.timestamp() - now.timestamp()).abs() <= 1);
    }
}
