//! Wall-clock access in the configured time zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Time zone meetings are scheduled in.
    fn timezone(&self) -> Tz;

    /// Current instant in [`Clock::timezone`].
    fn now(&self) -> DateTime<Tz>;

    /// Current local date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn timezone(&self) -> Tz {
        self.tz
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clock frozen at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now }
    }

    /// Freeze at a local wall-clock time in `tz` (earliest instant if ambiguous).
    pub fn at_local(tz: Tz, local: NaiveDateTime) -> Option<Self> {
        tz.from_local_datetime(&local).earliest().map(Self::new)
    }
}

impl Clock for FixedClock {
    fn timezone(&self) -> Tz {
        self.now.timezone()
    }

    fn now(&self) -> DateTime<Tz> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today_uses_local_date() {
        // 20:30 UTC is already the next day in Almaty (+05:00).
        let utc = Utc.with_ymd_and_hms(2026, 2, 4, 20, 30, 0).unwrap();
        let clock = FixedClock::new(utc.with_timezone(&chrono_tz::Asia::Almaty));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 2, 5).unwrap());
    }

    #[test]
    fn test_system_clock_zone() {
        let clock = SystemClock::new(chrono_tz::Europe::Berlin);
        assert_eq!(clock.timezone(), chrono_tz::Europe::Berlin);
        assert_eq!(clock.now().timezone(), chrono_tz::Europe::Berlin);
    }
}
