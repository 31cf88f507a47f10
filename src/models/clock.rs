//! Time-of-day windows.
//!
//! Timetables repeat weekly, so every window in this crate is a
//! wall-clock interval on a single day rather than an absolute instant.
//!
//! # Time Model
//! Windows are half-open `[start, end)` over `chrono::NaiveTime`.
//! Durations are whole minutes.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

/// A time-of-day interval [start, end).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClockWindow {
    /// Interval start (inclusive).
    pub start: NaiveTime,
    /// Interval end (exclusive).
    pub end: NaiveTime,
}

impl ClockWindow {
    /// Creates a new window.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parses a window from `HH:MM` (or `HH:MM:SS`) strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    /// Duration in minutes. Zero for inverted windows.
    #[inline]
    pub fn duration_minutes(&self) -> u32 {
        let mins = minutes_of_day(self.end) as i64 - minutes_of_day(self.start) as i64;
        mins.max(0) as u32
    }

    /// Whether `end` is strictly after `start`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.end > self.start
    }

    /// Whether `other` lies entirely inside this window.
    pub fn covers(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Parses a wall-clock time, accepting `HH:MM` and `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| TimetableError::MalformedTime {
            value: value.to_string(),
        })
}

/// Minutes since midnight.
#[inline]
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Gap in minutes from `earlier` to `later` (negative when they overlap).
#[inline]
pub fn gap_minutes(earlier: NaiveTime, later: NaiveTime) -> i64 {
    minutes_of_day(later) as i64 - minutes_of_day(earlier) as i64
}
