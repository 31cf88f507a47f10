//! Conflict report model.
//!
//! Conflicts are non-fatal findings surfaced to the caller for manual
//! remediation. Severity tells the caller whether publishing should be
//! blocked (`Error`) or only flagged (`Warning`, `Info`).

use std::collections::HashSet;
use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Classification of timetable conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// A teacher holds two different activities in one slot.
    TeacherConflict,
    /// A room holds two entries in one slot.
    ClassroomConflict,
    /// A teacher exceeds the daily hour cap.
    TeacherOverload,
    /// A subject received fewer periods than required.
    InsufficientPeriods,
    /// A special class could not be placed.
    SpecialClassConflict,
    /// A lab period has no adjacent partner.
    LabSequenceBroken,
    /// Persisting an entry would violate a uniqueness constraint.
    PersistenceConflict,
}

impl ConflictType {
    /// Wire name (e.g., `TEACHER_CONFLICT`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TeacherConflict => "TEACHER_CONFLICT",
            Self::ClassroomConflict => "CLASSROOM_CONFLICT",
            Self::TeacherOverload => "TEACHER_OVERLOAD",
            Self::InsufficientPeriods => "INSUFFICIENT_PERIODS",
            Self::SpecialClassConflict => "SPECIAL_CLASS_CONFLICT",
            Self::LabSequenceBroken => "LAB_SEQUENCE_BROKEN",
            Self::PersistenceConflict => "PERSISTENCE_CONFLICT",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single conflict finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    /// Type of conflict.
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: Severity,
    /// Involved entities (teacher, room, subject, special class IDs).
    pub entity_ids: Vec<String>,
    /// Day, when the conflict is tied to one.
    pub day: Option<Weekday>,
    /// Slot, when the conflict is tied to one.
    pub time_slot_id: Option<String>,
    /// Human-readable description.
    pub description: String,
}

impl Conflict {
    fn new(
        conflict_type: ConflictType,
        severity: Severity,
        entity_ids: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            conflict_type,
            severity,
            entity_ids,
            day: None,
            time_slot_id: None,
            description: description.into(),
        }
    }

    /// Pins the conflict to a day.
    pub fn on_day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    /// Pins the conflict to a slot.
    pub fn at_slot(mut self, day: Weekday, time_slot_id: impl Into<String>) -> Self {
        self.day = Some(day);
        self.time_slot_id = Some(time_slot_id.into());
        self
    }

    /// Teacher double-booked in one slot.
    pub fn teacher_conflict(
        teacher_id: &str,
        activities: &[&str],
        day: Weekday,
        slot_id: &str,
    ) -> Self {
        let mut ids = vec![teacher_id.to_string()];
        ids.extend(activities.iter().map(|a| a.to_string()));
        Self::new(
            ConflictType::TeacherConflict,
            Severity::Error,
            ids,
            format!(
                "Teacher {teacher_id} has {} different activities ({}) on {day:?} in slot {slot_id}",
                activities.len(),
                activities.join(", ")
            ),
        )
        .at_slot(day, slot_id)
    }

    /// Room double-booked in one slot.
    pub fn classroom_conflict(classroom_id: &str, count: usize, day: Weekday, slot_id: &str) -> Self {
        Self::new(
            ConflictType::ClassroomConflict,
            Severity::Error,
            vec![classroom_id.to_string()],
            format!("Classroom {classroom_id} has {count} entries on {day:?} in slot {slot_id}"),
        )
        .at_slot(day, slot_id)
    }

    /// Teacher over the daily cap.
    pub fn teacher_overload(teacher_id: &str, day: Weekday, minutes: u32, cap_minutes: u32) -> Self {
        Self::new(
            ConflictType::TeacherOverload,
            Severity::Error,
            vec![teacher_id.to_string()],
            format!(
                "Teacher {teacher_id} is scheduled {minutes} min on {day:?}, cap is {cap_minutes} min"
            ),
        )
        .on_day(day)
    }

    /// Subject short of its weekly requirement.
    pub fn insufficient_periods(subject_id: &str, is_lab: bool, scheduled: u32, required: u32) -> Self {
        let kind = if is_lab { "lab sessions" } else { "theory periods" };
        Self::new(
            ConflictType::InsufficientPeriods,
            Severity::Warning,
            vec![subject_id.to_string()],
            format!("Subject {subject_id} has {scheduled} of {required} required {kind}"),
        )
    }

    /// Special class that found no free window.
    pub fn special_class_conflict(special_id: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ConflictType::SpecialClassConflict,
            Severity::Info,
            vec![special_id.to_string()],
            format!("Special class {special_id} was not placed: {reason}"),
        )
    }

    /// Lab period without an adjacent partner.
    pub fn lab_sequence_broken(subject_id: &str, day: Weekday, slot_id: &str) -> Self {
        Self::new(
            ConflictType::LabSequenceBroken,
            Severity::Error,
            vec![subject_id.to_string()],
            format!("Lab period of {subject_id} on {day:?} in slot {slot_id} has no adjacent partner"),
        )
        .at_slot(day, slot_id)
    }

    /// Entry rejected by a storage uniqueness constraint.
    pub fn persistence_conflict(
        entity_id: &str,
        day: Weekday,
        slot_id: &str,
        reason: impl fmt::Display,
    ) -> Self {
        Self::new(
            ConflictType::PersistenceConflict,
            Severity::Error,
            vec![entity_id.to_string()],
            format!("Entry for {entity_id} on {day:?} in slot {slot_id} not stored: {reason}"),
        )
        .at_slot(day, slot_id)
    }
}

/// Removes exact duplicates, keeping first occurrences in order.
///
/// Allocation and validation both report shortfalls; identical findings
/// collapse to one while distinct theory/lab shortfalls of a subject stay.
pub fn dedup_conflicts(conflicts: Vec<Conflict>) -> Vec<Conflict> {
    let mut seen = HashSet::new();
    conflicts
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
