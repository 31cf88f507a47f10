//! Faculty availability and leave.
//!
//! # Precedence
//! Mirrors a resource calendar: a slot is available to a teacher iff
//! - it is covered by at least one available window on that day
//!   (or the teacher declared no windows at all), AND
//! - it does not overlap a declared unavailable window, AND
//! - it does not overlap an approved leave.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::ClockWindow;

/// A declared availability (or unavailability) window for a teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyAvailability {
    /// Teacher this row belongs to.
    pub teacher_id: String,
    /// Day of week.
    pub day: Weekday,
    /// Clock window.
    pub window: ClockWindow,
    /// `false` declares the window blocked.
    pub is_available: bool,
    /// Preference level (higher = more preferred). Informational.
    pub preference_level: u8,
}

impl FacultyAvailability {
    /// Declares the teacher available during `window`.
    pub fn available(teacher_id: impl Into<String>, day: Weekday, window: ClockWindow) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            day,
            window,
            is_available: true,
            preference_level: 0,
        }
    }

    /// Declares the teacher unavailable during `window`.
    pub fn unavailable(teacher_id: impl Into<String>, day: Weekday, window: ClockWindow) -> Self {
        Self {
            is_available: false,
            ..Self::available(teacher_id, day, window)
        }
    }

    /// Sets the preference level.
    pub fn with_preference(mut self, level: u8) -> Self {
        self.preference_level = level;
        self
    }
}

/// Approval state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// When a leave applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LeaveSpan {
    /// Calendar dates, inclusive on both ends.
    Dated { from: NaiveDate, to: NaiveDate },
    /// Every week on the given day.
    Recurring { day: Weekday },
}

/// A faculty leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyLeave {
    /// Teacher on leave.
    pub teacher_id: String,
    /// Days the leave covers.
    pub span: LeaveSpan,
    /// Part of the day. `None` = whole day.
    pub window: Option<ClockWindow>,
    /// Only approved leave blocks scheduling.
    pub status: LeaveStatus,
}

impl FacultyLeave {
    /// Creates an approved full-day leave over a date range.
    pub fn dated(teacher_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            span: LeaveSpan::Dated { from, to },
            window: None,
            status: LeaveStatus::Approved,
        }
    }

    /// Creates an approved full-day leave every week on `day`.
    pub fn recurring(teacher_id: impl Into<String>, day: Weekday) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            span: LeaveSpan::Recurring { day },
            window: None,
            status: LeaveStatus::Approved,
        }
    }

    /// Restricts the leave to part of the day.
    pub fn with_window(mut self, window: ClockWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Sets the approval status.
    pub fn with_status(mut self, status: LeaveStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this leave blocks `window` on `day`.
    ///
    /// `reference_week` is the Monday of the week being planned; without it
    /// a dated leave blocks every weekday its range touches.
    pub fn blocks(&self, day: Weekday, window: &ClockWindow, reference_week: Option<NaiveDate>) -> bool {
        if self.status != LeaveStatus::Approved {
            return false;
        }
        let day_matches = match &self.span {
            LeaveSpan::Recurring { day: d } => *d == day,
            LeaveSpan::Dated { from, to } => match reference_week {
                Some(monday) => monday
                    .checked_add_days(Days::new(u64::from(day.num_days_from_monday())))
                    .is_some_and(|date| *from <= date && date <= *to),
                None => range_touches_weekday(*from, *to, day),
            },
        };
        day_matches && self.window.map_or(true, |w| w.overlaps(window))
    }
}

fn range_touches_weekday(from: NaiveDate, to: NaiveDate, day: Weekday) -> bool {
    if to < from {
        return false;
    }
    if (to - from).num_days() >= 6 {
        return true;
    }
    from.iter_days().take_while(|d| *d <= to).any(|d| d.weekday() == day)
}

/// One teacher's combined availability view.
#[derive(Debug, Clone, Default)]
pub struct TeacherCalendar<'a> {
    windows: Vec<&'a FacultyAvailability>,
    leaves: Vec<&'a FacultyLeave>,
    reference_week: Option<NaiveDate>,
}

impl<'a> TeacherCalendar<'a> {
    /// Collects the rows belonging to `teacher_id`.
    pub fn for_teacher(
        teacher_id: &str,
        availability: &'a [FacultyAvailability],
        leaves: &'a [FacultyLeave],
        reference_week: Option<NaiveDate>,
    ) -> Self {
        Self {
            windows: availability
                .iter()
                .filter(|a| a.teacher_id == teacher_id)
                .collect(),
            leaves: leaves.iter().filter(|l| l.teacher_id == teacher_id).collect(),
            reference_week,
        }
    }

    /// Whether the teacher can teach during `window` on `day`.
    pub fn is_available(&self, day: Weekday, window: &ClockWindow) -> bool {
        // Blocked rows and leave override everything
        if self
            .windows
            .iter()
            .any(|a| !a.is_available && a.day == day && a.window.overlaps(window))
        {
            return false;
        }
        if self
            .leaves
            .iter()
            .any(|l| l.blocks(day, window, self.reference_week))
        {
            return false;
        }

        let declared: Vec<_> = self.windows.iter().filter(|a| a.is_available).collect();
        if declared.is_empty() {
            return true;
        }
        declared
            .iter()
            .any(|a| a.day == day && a.window.covers(window))
    }
}
