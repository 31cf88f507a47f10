//! Scheduled entry (engine output).
//!
//! One entry occupies exactly one time slot. A lab session is two entries
//! sharing subject, teacher and room; a special class spanning several
//! slots is one entry per slot.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::TimeSlot;

/// A subject, special class, break or lunch placed in one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    /// Subject taught. `None` for breaks, lunch and subject-less special classes.
    pub subject_id: Option<String>,
    /// Teacher. `None` for breaks and lunch.
    pub teacher_id: Option<String>,
    /// Room. `None` for breaks and lunch.
    pub classroom_id: Option<String>,
    /// Occupied slot.
    pub time_slot_id: String,
    /// Day of the slot.
    pub day: Weekday,
    /// Lab period.
    pub is_lab: bool,
    /// Inserted break.
    pub is_break: bool,
    /// Inserted lunch.
    pub is_lunch: bool,
    /// Originating special class, if any.
    pub special_class_id: Option<String>,
    /// Slot length in minutes.
    pub duration_minutes: u32,
    /// Number of slots in the unit this entry belongs to (2 for labs).
    pub consecutive_slots: u32,
}

impl ScheduledEntry {
    /// A theory period.
    pub fn theory(
        subject_id: impl Into<String>,
        teacher_id: impl Into<String>,
        classroom_id: impl Into<String>,
        slot: &TimeSlot,
    ) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            teacher_id: Some(teacher_id.into()),
            classroom_id: Some(classroom_id.into()),
            time_slot_id: slot.id.clone(),
            day: slot.day,
            is_lab: false,
            is_break: false,
            is_lunch: false,
            special_class_id: None,
            duration_minutes: slot.duration_minutes,
            consecutive_slots: 1,
        }
    }

    /// One half of a lab session.
    pub fn lab(
        subject_id: impl Into<String>,
        teacher_id: impl Into<String>,
        classroom_id: impl Into<String>,
        slot: &TimeSlot,
    ) -> Self {
        Self {
            is_lab: true,
            consecutive_slots: 2,
            ..Self::theory(subject_id, teacher_id, classroom_id, slot)
        }
    }

    /// A break (or lunch) with no teacher or room.
    pub fn amenity(slot: &TimeSlot, is_lunch: bool) -> Self {
        Self {
            subject_id: None,
            teacher_id: None,
            classroom_id: None,
            time_slot_id: slot.id.clone(),
            day: slot.day,
            is_lab: false,
            is_break: !is_lunch,
            is_lunch,
            special_class_id: None,
            duration_minutes: slot.duration_minutes,
            consecutive_slots: 1,
        }
    }

    /// Links the entry to a special class spanning `span` slots.
    pub fn with_special(mut self, special_class_id: impl Into<String>, span: u32) -> Self {
        self.special_class_id = Some(special_class_id.into());
        self.consecutive_slots = span;
        self
    }

    /// Breaks and lunch.
    #[inline]
    pub fn is_amenity(&self) -> bool {
        self.is_break || self.is_lunch
    }

    /// Whether the entry came from a special class.
    #[inline]
    pub fn is_special(&self) -> bool {
        self.special_class_id.is_some()
    }

    /// What the entry teaches: subject, else special class ID.
    pub fn activity_key(&self) -> Option<&str> {
        self.subject_id
            .as_deref()
            .or(self.special_class_id.as_deref())
    }
}
