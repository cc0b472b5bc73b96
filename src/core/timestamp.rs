//! Relative time values for datasets.
//!
//! Each dataset stores its offset from the group's reference time. The
//! value keeps its own unit internally and converts on read, so a driver
//! can store seconds and a caller can ask for hours without either side
//! mutating the stored timestamp.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::util::Error;

/// Unit of a relative time value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    #[default]
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// All units, smallest first.
    pub const ALL: [TimeUnit; 6] = [
        Self::Milliseconds,
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Weeks,
    ];

    /// Length of one unit in milliseconds.
    #[inline]
    pub const fn milliseconds(self) -> f64 {
        match self {
            Self::Milliseconds => 1.0,
            Self::Seconds => 1_000.0,
            Self::Minutes => 60_000.0,
            Self::Hours => 3_600_000.0,
            Self::Days => 86_400_000.0,
            Self::Weeks => 604_800_000.0,
        }
    }

    /// Short name used in metadata and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    /// Parse the spellings found in mesh result files (`"s"`, `"sec"`,
    /// `"Hours"`, `"days since ..."` and so on). Only the first word counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let unit = match word.as_str() {
            "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Self::Milliseconds,
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Seconds,
            "m" | "min" | "mins" | "minute" | "minutes" => Self::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => Self::Hours,
            "d" | "day" | "days" => Self::Days,
            "w" | "week" | "weeks" => Self::Weeks,
            _ => return Err(Error::invalid(format!("unknown time unit '{}'", s))),
        };
        Ok(unit)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time offset from a reference time, with an explicit unit.
#[derive(Clone, Copy, Default)]
pub struct RelativeTimestamp {
    /// Duration in milliseconds.
    millis: f64,
}

impl RelativeTimestamp {
    /// Create from a value in `unit`.
    #[inline]
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self {
            millis: value * unit.milliseconds(),
        }
    }

    /// Shorthand for `new(hours, TimeUnit::Hours)`.
    #[inline]
    pub fn from_hours(hours: f64) -> Self {
        Self::new(hours, TimeUnit::Hours)
    }

    /// Value expressed in `unit`.
    #[inline]
    pub fn value(&self, unit: TimeUnit) -> f64 {
        self.millis / unit.milliseconds()
    }

    /// Whole milliseconds, rounded to nearest.
    #[inline]
    pub fn whole_milliseconds(&self) -> i64 {
        self.millis.round() as i64
    }
}

impl PartialEq for RelativeTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl PartialOrd for RelativeTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.millis.partial_cmp(&other.millis)
    }
}

impl Add for RelativeTimestamp {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            millis: self.millis + rhs.millis,
        }
    }
}

impl Sub for RelativeTimestamp {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            millis: self.millis - rhs.millis,
        }
    }
}

impl fmt::Debug for RelativeTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelativeTimestamp({}h)", self.value(TimeUnit::Hours))
    }
}
