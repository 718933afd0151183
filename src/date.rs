//! The LLSD date scalar.
//!
//! A date is a count of seconds since the Unix epoch held as an `f64`, which is
//! exactly what the binary encoding carries. The text encodings use the ISO-8601
//! form `YYYY-MM-DDTHH:MM:SSZ`, with a two-digit `.ff` fraction only when the
//! date has a non-zero number of centiseconds.
//!
//! ```rust
//! use serde_llsd::LlsdDate;
//!
//! let date = LlsdDate::parse("2007-12-28T09:22:53.10Z").unwrap();
//! assert_eq!(date.to_string(), "2007-12-28T09:22:53.10Z");
//! assert_eq!(LlsdDate::epoch().to_string(), "1970-01-01T00:00:00Z");
//! ```

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

const EPOCH_TEXT: &str = "1970-01-01T00:00:00Z";

/// UTC timestamp with fractional seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct LlsdDate {
    seconds: f64,
}

impl LlsdDate {
    /// Creates a date from seconds since the Unix epoch.
    #[must_use]
    pub const fn from_seconds(seconds: f64) -> Self {
        LlsdDate { seconds }
    }

    /// The Unix epoch, which is also the value of an empty date.
    #[must_use]
    pub const fn epoch() -> Self {
        LlsdDate { seconds: 0.0 }
    }

    /// Seconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Converts a chrono timestamp.
    #[must_use]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let seconds =
            datetime.timestamp() as f64 + f64::from(datetime.timestamp_subsec_nanos()) / 1e9;
        LlsdDate { seconds }
    }

    /// Converts to a chrono timestamp, rounded to the nanosecond.
    ///
    /// Returns `None` when the date is outside chrono's range or not finite.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.seconds.is_finite() {
            return None;
        }
        let whole = self.seconds.floor();
        let nanos = ((self.seconds - whole) * 1e9).round() as u32;
        let (whole, nanos) = if nanos >= 1_000_000_000 {
            (whole + 1.0, 0)
        } else {
            (whole, nanos)
        };
        DateTime::from_timestamp(whole as i64, nanos)
    }

    /// Parses the ISO-8601 text form.
    ///
    /// Accepts RFC 3339 timestamps with any fraction and offset, the same
    /// without a zone (taken as UTC), and a bare `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the text is not a recognizable date.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::from_datetime(datetime.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::from_datetime(naive.and_utc()));
        }
        if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
                return Ok(Self::from_datetime(midnight.and_utc()));
            }
        }
        Err(Error::syntax(0, &format!("invalid date '{}'", text)))
    }
}

impl fmt::Display for LlsdDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.seconds.is_finite() {
            return f.write_str(EPOCH_TEXT);
        }
        // Centiseconds are rounded as a whole so that ".10" survives the trip
        // through an inexact f64.
        let centis = (self.seconds * 100.0).round() as i64;
        let whole = centis.div_euclid(100);
        let fraction = centis.rem_euclid(100);
        match DateTime::from_timestamp(whole, 0) {
            Some(datetime) => {
                write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S"))?;
                if fraction != 0 {
                    write!(f, ".{:02}", fraction)?;
                }
                f.write_str("Z")
            }
            None => f.write_str(EPOCH_TEXT),
        }
    }
}

impl From<DateTime<Utc>> for LlsdDate {
    fn from(value: DateTime<Utc>) -> Self {
        LlsdDate::from_datetime(value)
    }
}

impl From<f64> for LlsdDate {
    fn from(value: f64) -> Self {
        LlsdDate::from_seconds(value)
    }
}
