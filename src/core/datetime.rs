//! Absolute reference time of a dataset group.
//!
//! Dataset times are relative; the group's [`DateTime`] anchors them. A
//! default `DateTime` is invalid, which is how "no reference time" is
//! represented.

use std::fmt;
use std::ops::{Add, Sub};

use time::macros::{datetime, format_description};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

use super::{RelativeTimestamp, TimeUnit};

/// Julian day of 1970-01-01T00:00:00.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

const UNIX_EPOCH: PrimitiveDateTime = datetime!(1970-01-01 0:00);

/// Calendar date and time without time zone.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    inner: Option<PrimitiveDateTime>,
}

impl DateTime {
    /// Build from calendar fields. Out-of-range fields give an invalid value.
    pub fn new(year: i32, month: u8, day: u8, hours: u8, minutes: u8, seconds: f64) -> Self {
        let whole = seconds.trunc();
        let millis = ((seconds - whole) * 1000.0).round() as u16;
        let inner = Month::try_from(month)
            .ok()
            .and_then(|m| Date::from_calendar_date(year, m, day).ok())
            .zip(Time::from_hms_milli(hours, minutes, whole as u8, millis.min(999)).ok())
            .map(|(d, t)| PrimitiveDateTime::new(d, t));
        Self { inner }
    }

    /// Build from a Julian day number (days since noon, 1 January 4713 BC).
    pub fn from_julian_day(julian_day: f64) -> Self {
        let unix_days = julian_day - UNIX_EPOCH_JULIAN_DAY;
        let millis = (unix_days * 86_400_000.0).round() as i64;
        Self {
            inner: UNIX_EPOCH.checked_add(Duration::milliseconds(millis)),
        }
    }

    /// Parse `YYYY-MM-DD hh:mm:ss`, `YYYY-MM-DDThh:mm:ss`, `YYYY-MM-DD hh:mm`
    /// or `YYYY-MM-DD`. Trailing `Z` and surrounding whitespace are ignored.
    /// Unparseable text gives an invalid value.
    pub fn parse(text: &str) -> Self {
        let text = text.trim().trim_end_matches('Z');
        let inner = PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day] [hour]:[minute]"),
            )
        })
        .or_else(|_| Date::parse(text, format_description!("[year]-[month]-[day]")).map(|d| d.midnight()))
        .ok();
        Self { inner }
    }

    /// Whether this holds an actual date.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Julian day, or `None` when invalid.
    pub fn julian_day(&self) -> Option<f64> {
        let dt = self.inner?;
        let unix_ms = (dt.assume_utc().unix_timestamp_nanos() / 1_000_000) as f64;
        Some(unix_ms / 86_400_000.0 + UNIX_EPOCH_JULIAN_DAY)
    }

    /// ISO 8601 text `YYYY-MM-DDThh:mm:ss`, empty when invalid.
    pub fn to_iso8601(&self) -> String {
        self.inner
            .and_then(|dt| {
                dt.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Underlying `time` value.
    pub fn as_primitive(&self) -> Option<PrimitiveDateTime> {
        self.inner
    }
}

impl From<PrimitiveDateTime> for DateTime {
    fn from(dt: PrimitiveDateTime) -> Self {
        Self { inner: Some(dt) }
    }
}

impl Add<RelativeTimestamp> for DateTime {
    type Output = DateTime;

    fn add(self, rhs: RelativeTimestamp) -> DateTime {
        let offset = Duration::milliseconds(rhs.whole_milliseconds());
        Self {
            inner: self.inner.and_then(|dt| dt.checked_add(offset)),
        }
    }
}

impl Sub for DateTime {
    type Output = RelativeTimestamp;

    /// Offset between two times. Invalid operands give a zero offset.
    fn sub(self, rhs: DateTime) -> RelativeTimestamp {
        match (self.inner, rhs.inner) {
            (Some(a), Some(b)) => {
                let millis = (a - b).whole_milliseconds() as f64;
                RelativeTimestamp::new(millis, TimeUnit::Milliseconds)
            }
            _ => RelativeTimestamp::default(),
        }
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Some(_) => write!(f, "DateTime({})", self.to_iso8601()),
            None => f.write_str("DateTime(invalid)"),
        }
    }
}
