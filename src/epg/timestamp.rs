//! Broadcast start/stop timestamps.
//!
//! Guides encode times as fourteen ASCII digits, `YYYYMMDDhhmmss`, with no
//! separators and no zone suffix. The value is kept as wall-clock time;
//! [`Timestamp::and_utc`] anchors it when an instant is needed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use thiserror::Error;

const FORMAT: &str = "%Y%m%d%H%M%S";
const DIGITS: usize = 14;

/// A value that is not a fourteen-digit guide timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected YYYYMMDDhhmmss, found {value:?}")]
pub struct TimestampError {
    pub value: String,
}

/// Wall-clock time of a broadcast boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Parse a `YYYYMMDDhhmmss` attribute value.
    ///
    /// The length and digit checks come first because chrono's `%Y`
    /// accepts signs and widths other than four.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        let err = || TimestampError {
            value: value.to_string(),
        };

        if value.len() != DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let parsed = NaiveDateTime::parse_from_str(value, FORMAT).map_err(|_| err())?;
        // chrono reads a seconds field of 60 as a leap second.
        if parsed.nanosecond() >= 1_000_000_000 {
            return Err(err());
        }
        Ok(Timestamp(parsed))
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Interpret the wall-clock value as UTC.
    pub fn and_utc(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let ts = Timestamp::parse("20240101120000").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 0);
        assert_eq!(ts.second(), 0);

        let ts = Timestamp::parse("19991231235958").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (1999, 12, 31));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (23, 59, 58));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        for bad in [
            "",
            "2024-01-01",
            "202401011200",
            "202401011200000",
            "2024010112000a",
            "20240101120000 +0000",
            "+2024010112000",
            " 2024010112000",
        ] {
            let err = Timestamp::parse(bad).unwrap_err();
            assert_eq!(err.value, bad);
        }
    }

    #[test]
    fn test_rejects_impossible_dates() {
        assert!(Timestamp::parse("20241301000000").is_err());
        assert!(Timestamp::parse("20240230000000").is_err());
        assert!(Timestamp::parse("20240101250000").is_err());
        assert!(Timestamp::parse("20240101126000").is_err());
        assert!(Timestamp::parse("20240101120060").is_err());
        assert!(Timestamp::parse("20241231235960").is_err());
        // Leap day
        assert!(Timestamp::parse("20240229000000").is_ok());
        assert!(Timestamp::parse("20230229000000").is_err());
    }

    #[test]
    fn test_display_and_utc() {
        let ts: Timestamp = "20240101130005".parse().unwrap();
        assert_eq!(ts.to_string(), "2024-01-01 13:00:05");
        assert_eq!(ts.and_utc().timestamp(), 1_704_114_005);
    }

    #[test]
    fn test_error_message_carries_value() {
        let err = Timestamp::parse("2024").unwrap_err();
        assert_eq!(err.to_string(), "expected YYYYMMDDhhmmss, found \"2024\"");
    }
}
