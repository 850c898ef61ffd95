//! Calendar day and hour-slot formats.
//!
//! Dates travel as `DD.MM.YYYY` and slot times as `HH:00` (zero-padded,
//! 24-hour, minute always `00`). Persisted records and rendered text depend
//! on these exact strings, so parsing is strict: an accepted input always
//! formats back to itself.
//!
//! There is no timezone. A [`BookingDate`] is a local wall-clock day.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ValidationError;

/// `chrono` format string for [`BookingDate`].
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Malformed date or time input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid date {value:?}, expected DD.MM.YYYY")]
    InvalidDate { value: String },

    #[error("invalid time {value:?}, expected HH:00")]
    InvalidTime { value: String },
}

/// A calendar day in `DD.MM.YYYY` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingDate(NaiveDate);

impl BookingDate {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from year, month and day, if it exists.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[must_use]
    pub const fn as_naive(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// The following calendar day, or `None` at the end of the representable range.
    #[must_use]
    pub fn next_day(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl From<NaiveDate> for BookingDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for BookingDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidDate {
            value: s.to_string(),
        };
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid())?;
        // chrono accepts unpadded fields like "1.6.2025"; the wire format does not
        if date.format(DATE_FORMAT).to_string() != s {
            return Err(invalid());
        }
        Ok(Self(date))
    }
}

impl TryFrom<String> for BookingDate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookingDate> for String {
    fn from(date: BookingDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for BookingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// An hour-of-day slot in `HH:00` form.
///
/// Ordering is by hour, which for the zero-padded wire form coincides with
/// string ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(u8);

impl SlotTime {
    /// Returns the slot starting at `hour`, if `hour` is in `0..=23`.
    #[must_use]
    pub const fn from_hour(hour: u8) -> Option<Self> {
        if hour <= 23 { Some(Self(hour)) } else { None }
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.0
    }
}

impl FromStr for SlotTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTime {
            value: s.to_string(),
        };
        let hh = s.strip_suffix(":00").ok_or_else(invalid)?;
        if hh.len() != 2 || !hh.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = hh.parse().map_err(|_| invalid())?;
        Self::from_hour(hour).ok_or_else(invalid)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(time: SlotTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

/// One bookable hour: a `(date, time)` pair.
///
/// Orders chronologically, by date and then by hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub date: BookingDate,
    pub time: SlotTime,
}

impl Slot {
    #[must_use]
    pub const fn new(date: BookingDate, time: SlotTime) -> Self {
        Self { date, time }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

/// The inclusive `[start, end]` range of bookable hours per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: SlotTime,
    end: SlotTime,
}

impl HourWindow {
    pub const fn new(start: u8, end: u8) -> Result<Self, ValidationError> {
        if start > end || end > 23 {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self {
            start: SlotTime(start),
            end: SlotTime(end),
        })
    }

    #[must_use]
    pub const fn start(self) -> SlotTime {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> SlotTime {
        self.end
    }

    #[must_use]
    pub const fn contains(self, time: SlotTime) -> bool {
        time.0 >= self.start.0 && time.0 <= self.end.0
    }

    /// Every slot in the window, ascending by hour.
    pub fn slots(self) -> impl Iterator<Item = SlotTime> {
        (self.start.0..=self.end.0).map(SlotTime)
    }
}

impl Default for HourWindow {
    fn default() -> Self {
        Self {
            start: SlotTime(8),
            end: SlotTime(20),
        }
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
