//! The reference clock.
//!
//! Every "today" comparison in the crate goes through a [`Clock`]. Calendar
//! days are UTC days: there is no per-user timezone.

use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, UtcOffset};

pub trait Clock {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        calendar_day(self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock pinned to one instant. Used by tests and by the `--today` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    instant: OffsetDateTime,
}

impl FixedClock {
    pub fn new(instant: OffsetDateTime) -> Self {
        Self { instant }
    }

    /// Pins the clock to noon UTC on `day`.
    pub fn on_day(day: Date) -> Self {
        Self::new(day.with_time(time!(12:00)).assume_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.instant
    }
}

pub fn calendar_day(instant: OffsetDateTime) -> Date {
    instant.to_offset(UtcOffset::UTC).date()
}

pub fn format_day(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .expect("calendar day formatting should never fail")
}

pub fn parse_day(raw: &str) -> Result<Date, ClockError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|source| {
        ClockError::InvalidDay {
            value: raw.to_string(),
            source,
        }
    })
}

pub fn format_instant(instant: OffsetDateTime) -> String {
    instant
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

pub fn parse_instant(raw: &str) -> Result<OffsetDateTime, ClockError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|source| ClockError::InvalidInstant {
        value: raw.to_string(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("invalid calendar day '{value}' (expected YYYY-MM-DD): {source}")]
    InvalidDay {
        value: String,
        source: time::error::Parse,
    },
    #[error("invalid RFC3339 timestamp '{value}': {source}")]
    InvalidInstant {
        value: String,
        source: time::error::Parse,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        calendar_day, format_day, format_instant, parse_day, parse_instant, Clock, FixedClock,
    };
    use time::macros::{date, datetime};

    #[test]
    fn fixed_clock_reports_pinned_day() {
        let clock = FixedClock::on_day(date!(2024 - 01 - 03));
        assert_eq!(clock.today(), date!(2024 - 01 - 03));
        assert_eq!(format_instant(clock.now()), "2024-01-03T12:00:00Z");
    }

    #[test]
    fn calendar_day_uses_utc_midnight() {
        let late_evening_west = datetime!(2024-01-03 23:30 -05:00);
        assert_eq!(calendar_day(late_evening_west), date!(2024 - 01 - 04));

        let just_before_midnight = datetime!(2024-01-03 23:59:59 UTC);
        assert_eq!(calendar_day(just_before_midnight), date!(2024 - 01 - 03));
    }

    #[test]
    fn day_text_round_trips_and_rejects_garbage() {
        let day = parse_day(" 2024-02-29 ").expect("leap day should parse");
        assert_eq!(format_day(day), "2024-02-29");
        assert!(parse_day("2023-02-29").is_err());
        assert!(parse_day("yesterday").is_err());
    }

    #[test]
    fn instants_are_normalized_to_utc() {
        let parsed = parse_instant("2024-01-03T10:00:00+02:00").expect("offset should parse");
        assert_eq!(format_instant(parsed), "2024-01-03T08:00:00Z");
        let err = parse_instant("2024-01-03").expect_err("date alone is not an instant");
        assert!(err.to_string().contains("invalid RFC3339 timestamp"));
    }
}
