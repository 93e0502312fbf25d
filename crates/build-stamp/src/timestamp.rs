//! Clock reading captured once per build.
//!
//! The transform never reads the clock itself; callers capture a
//! [`Timestamp`] (usually with [`Timestamp::now`]) and pass it in.

use chrono::{Datelike, Local, Timelike};
use core::fmt;

use crate::field::Field;

/// Two-digit year the firmware counts from (watch year 0 == 2020).
pub const YEAR_EPOCH_OFFSET: i32 = 20;

/// A calendar date and wall-clock time at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
}

impl Timestamp {
    /// Capture the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Capture the date and time parts of any chrono date-time.
    ///
    /// Seconds and below are dropped.
    #[must_use]
    // SAFETY: chrono keeps month <= 12, day <= 31, hour <= 23, minute <= 59.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_datetime<T: Datelike + Timelike>(dt: &T) -> Self {
        Self {
            year: dt.year(),
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
        }
    }

    /// Value written for `field`.
    ///
    /// The year is reduced to two digits and offset by
    /// [`YEAR_EPOCH_OFFSET`], so 2024 becomes `4`. Years before 2020 go
    /// negative; the firmware is expected to reject them, not this crate.
    #[must_use]
    pub fn value(self, field: Field) -> i32 {
        match field {
            Field::Year => self.year.rem_euclid(100).saturating_sub(YEAR_EPOCH_OFFSET),
            Field::Month => i32::from(self.month),
            Field::Day => i32::from(self.day),
            Field::Hour => i32::from(self.hour),
            Field::Minute => i32::from(self.minute),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}
