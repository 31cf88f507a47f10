//! Time slot model.
//!
//! A time slot is one cell of the weekly grid: a day plus a clock window.
//! Slot IDs are unique across the whole week, so a slot already implies
//! its day; the day is still carried on every record for grouping.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::ClockWindow;
use crate::error::Result;

/// One cell of the weekly grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Day of week.
    pub day: Weekday,
    /// Start time.
    pub start: NaiveTime,
    /// End time.
    pub end: NaiveTime,
    /// Length in minutes.
    pub duration_minutes: u32,
    /// Fixed institutional break. Never scheduled.
    pub is_break: bool,
}

impl TimeSlot {
    /// Creates a teaching slot. Duration is derived from the window.
    pub fn new(id: impl Into<String>, day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: id.into(),
            day,
            start,
            end,
            duration_minutes: ClockWindow::new(start, end).duration_minutes(),
            is_break: false,
        }
    }

    /// Creates a slot from `HH:MM` strings.
    pub fn parse(id: impl Into<String>, day: Weekday, start: &str, end: &str) -> Result<Self> {
        let window = ClockWindow::parse(start, end)?;
        Ok(Self::new(id, day, window.start, window.end))
    }

    /// Marks this slot as a fixed break.
    pub fn as_break(mut self) -> Self {
        self.is_break = true;
        self
    }

    /// The slot's clock window.
    #[inline]
    pub fn window(&self) -> ClockWindow {
        ClockWindow::new(self.start, self.end)
    }
}

/// Sorts slots chronologically (day, then start time).
pub fn sort_chronologically(slots: &mut [&TimeSlot]) {
    slots.sort_by(|a, b| {
        a.day
            .num_days_from_monday()
            .cmp(&b.day.num_days_from_monday())
            .then(a.start.cmp(&b.start))
            .then(a.id.cmp(&b.id))
    });
}
