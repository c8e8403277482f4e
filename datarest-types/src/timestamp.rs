//! Whole-second timestamps for HTTP date headers.
//!
//! HTTP dates (`Last-Modified`, `If-Modified-Since`) carry one-second
//! resolution, so every comparison against them must happen on values
//! truncated to whole seconds. [`HttpDate`] enforces that at construction.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// IMF-fixdate, the preferred HTTP date format.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format, still accepted on input.
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete ANSI C `asctime()` format, still accepted on input.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// A header value could not be parsed as an HTTP date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP date: {0}")]
pub struct InvalidHttpDate(pub String);

/// A UTC timestamp truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpDate {
    /// Seconds since the Unix epoch.
    seconds: i64,
}

impl HttpDate {
    /// Creates a date from seconds since the Unix epoch.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    /// Truncates a timestamp to whole seconds.
    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
        }
    }

    /// Returns seconds since the Unix epoch.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.seconds
    }

    /// Converts back into a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.seconds, 0).unwrap_or_default()
    }

    /// Returns true if this date is strictly after `other`.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Parses any of the three HTTP date formats.
    pub fn parse(value: &str) -> Result<Self, InvalidHttpDate> {
        let value = value.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
            return Ok(Self::from_datetime(parsed.with_timezone(&Utc)));
        }

        for format in [IMF_FIXDATE, RFC_850, ASCTIME] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(Self::from_datetime(naive.and_utc()));
            }
        }

        Err(InvalidHttpDate(value.to_string()))
    }
}

impl From<DateTime<Utc>> for HttpDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

impl FromStr for HttpDate {
    type Err = InvalidHttpDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the IMF-fixdate form, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format(IMF_FIXDATE))
    }
}
