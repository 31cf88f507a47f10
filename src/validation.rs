//! Input validation for timetable generation.
//!
//! Runs during LOADING. Any issue found here is fatal: the run fails
//! before a single entry is placed. Detects:
//! - Missing entity categories (no teachers, rooms, slots or subjects)
//! - Duplicate IDs
//! - Subjects with no assigned teacher, or an unknown one
//! - Inverted time windows on slots and availability rows
//!
//! All issues are collected so the caller can fix them in one pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::scheduler::{EngineConfig, GenerationConstraints, TimetableInput};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationIssue>>;

/// A fatal input problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue category.
    pub kind: ValidationIssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of input issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssueKind {
    /// A required entity category is empty.
    MissingEntities,
    /// Two entities of one category share an ID.
    DuplicateId,
    /// A subject has no teacher.
    UnassignedTeacher,
    /// A subject names a teacher that does not exist.
    UnknownTeacher,
    /// A window ends at or before it starts.
    InvalidTimeWindow,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(kind: ValidationIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input snapshot for one batch.
///
/// Checks:
/// 1. Teachers, classrooms, working-day teaching slots and batch subjects exist
/// 2. No duplicate teacher, subject, classroom or slot IDs
/// 3. Every batch subject has a known teacher
/// 4. Slot and availability windows are well formed
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(issues)` with every detected issue.
pub fn validate_input(
    input: &TimetableInput,
    constraints: &GenerationConstraints,
    config: &EngineConfig,
) -> ValidationResult {
    let mut issues = Vec::new();
    let mut missing = |what: &str| {
        issues.push(ValidationIssue::new(
            ValidationIssueKind::MissingEntities,
            format!("No {what} available"),
        ));
    };

    if input.teachers.is_empty() {
        missing("teachers");
    }
    if input.classrooms.is_empty() {
        missing("classrooms");
    }
    if !input
        .time_slots
        .iter()
        .any(|s| !s.is_break && config.is_working_day(s.day))
    {
        missing("teaching time slots on working days");
    }
    if input.subjects_for(&constraints.batch).next().is_none() {
        missing(&format!("subjects for batch {}", constraints.batch));
    }

    check_unique(&mut issues, "teacher", input.teachers.iter().map(|t| t.id.as_str()));
    check_unique(&mut issues, "subject", input.subjects.iter().map(|s| s.id.as_str()));
    check_unique(&mut issues, "classroom", input.classrooms.iter().map(|c| c.id.as_str()));
    check_unique(&mut issues, "time slot", input.time_slots.iter().map(|s| s.id.as_str()));

    let teacher_ids: HashSet<&str> = input.teachers.iter().map(|t| t.id.as_str()).collect();
    for subject in input.subjects_for(&constraints.batch) {
        match subject.teacher_id.as_deref() {
            None => issues.push(ValidationIssue::new(
                ValidationIssueKind::UnassignedTeacher,
                format!("Subject '{}' has no assigned teacher", subject.id),
            )),
            Some(t) if !teacher_ids.contains(t) => issues.push(ValidationIssue::new(
                ValidationIssueKind::UnknownTeacher,
                format!("Subject '{}' references unknown teacher '{t}'", subject.id),
            )),
            Some(_) => {}
        }
    }

    for slot in &input.time_slots {
        if !slot.window().is_well_formed() {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::InvalidTimeWindow,
                format!("Time slot '{}' ends at or before it starts", slot.id),
            ));
        }
    }
    for row in &input.availability {
        if !row.window.is_well_formed() {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::InvalidTimeWindow,
                format!(
                    "Availability of teacher '{}' on {:?} ends at or before it starts",
                    row.teacher_id, row.day
                ),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_unique<'a>(
    issues: &mut Vec<ValidationIssue>,
    category: &str,
    ids: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(ValidationIssue::new(
                ValidationIssueKind::DuplicateId,
                format!("Duplicate {category} ID: {id}"),
            ));
        }
    }
}
