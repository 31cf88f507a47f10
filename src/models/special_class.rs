//! Special class model.
//!
//! Special classes (guest lectures, mentoring hours, electives shared
//! across batches) have a fixed teacher, room and time. They are placed
//! before generic allocation and are never moved afterwards.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::ClockWindow;

/// A fixed-time class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialClass {
    /// Unique identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Subject, if the class counts toward one.
    pub subject_id: Option<String>,
    /// Fixed teacher.
    pub teacher_id: String,
    /// Fixed room.
    pub classroom_id: String,
    /// Day of week.
    pub day: Weekday,
    /// Clock window the class must occupy.
    pub window: ClockWindow,
    /// Placement order (higher first).
    pub priority: i32,
}

impl SpecialClass {
    /// Creates a special class.
    pub fn new(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        classroom_id: impl Into<String>,
        day: Weekday,
        window: ClockWindow,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            subject_id: None,
            teacher_id: teacher_id.into(),
            classroom_id: classroom_id.into(),
            day,
            window,
            priority: 0,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Links the class to a subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Sets the placement priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
