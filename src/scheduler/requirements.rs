//! Weekly period requirements.
//!
//! Each subject yields up to two requirements: theory periods
//! (`hours_per_week`, one slot each) and lab sessions
//! (`ceil(lab_hours_per_week / 2)`, two consecutive slots each).
//!
//! # Keeping an existing timetable
//! When a run keeps the batch's stored entries, [`account_existing`]
//! records how many periods each requirement already holds, and the
//! allocator only places the rest.
//!
//! # Ordering
//! Labs first (they need adjacent pairs, which fragment quickly), then
//! theory; within each group, larger requirements first.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ScheduledEntry, Subject, Timetable};
use crate::validation::{ValidationIssue, ValidationIssueKind};

/// Periods a subject needs per week, of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Subject.
    pub subject_id: String,
    /// Department of the subject (for room preference).
    pub department: String,
    /// Teacher delivering the periods.
    pub teacher_id: String,
    /// Periods (theory) or sessions (lab) needed.
    pub periods_required: u32,
    /// Lab session requirement.
    pub is_lab: bool,
    /// Periods already held by the batch before this run.
    #[serde(default)]
    pub periods_scheduled: u32,
}

impl Requirement {
    /// Periods still to place in this run.
    #[inline]
    pub fn periods_outstanding(&self) -> u32 {
        self.periods_required.saturating_sub(self.periods_scheduled)
    }
}

/// Lab sessions needed for the given lab hours (two hours per session).
#[inline]
pub fn lab_sessions(lab_hours_per_week: u32) -> u32 {
    lab_hours_per_week.div_ceil(2)
}

/// Derives the ordered requirement list for a batch's subjects.
///
/// # Errors
/// A subject without an assigned teacher aborts the run.
pub fn build_requirements<'a>(subjects: impl IntoIterator<Item = &'a Subject>) -> Result<Vec<Requirement>> {
    let mut requirements = Vec::new();

    for subject in subjects {
        let teacher_id = subject.teacher_id.clone().ok_or_else(|| {
            vec![ValidationIssue::new(
                ValidationIssueKind::UnassignedTeacher,
                format!("Subject '{}' has no assigned teacher", subject.id),
            )]
        })?;

        if subject.lab_hours_per_week > 0 {
            requirements.push(Requirement {
                subject_id: subject.id.clone(),
                department: subject.department.clone(),
                teacher_id: teacher_id.clone(),
                periods_required: lab_sessions(subject.lab_hours_per_week),
                is_lab: true,
                periods_scheduled: 0,
            });
        }
        if subject.hours_per_week > 0 {
            requirements.push(Requirement {
                subject_id: subject.id.clone(),
                department: subject.department.clone(),
                teacher_id,
                periods_required: subject.hours_per_week,
                is_lab: false,
                periods_scheduled: 0,
            });
        }
    }

    // Stable: equal requirements keep input order
    requirements.sort_by(|a, b| {
        b.is_lab
            .cmp(&a.is_lab)
            .then(b.periods_required.cmp(&a.periods_required))
    });
    Ok(requirements)
}

/// Records the periods each requirement already holds in `existing`.
///
/// Theory counts non-special, non-lab entries of the subject; labs count
/// complete two-slot sessions.
pub fn account_existing(requirements: &mut [Requirement], existing: &[ScheduledEntry]) {
    if existing.is_empty() {
        return;
    }
    let held = Timetable {
        entries: existing.to_vec(),
        conflicts: Vec::new(),
    };
    for req in requirements.iter_mut() {
        req.periods_scheduled = if req.is_lab {
            held.lab_sessions(&req.subject_id)
        } else {
            held.theory_periods(&req.subject_id)
        };
    }
}
