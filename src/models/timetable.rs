//! Timetable (solution) model.
//!
//! A timetable is the set of entries produced for one batch plus the
//! conflicts found while producing and re-validating it.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{Conflict, ScheduledEntry, Severity};

/// Entries and conflicts for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timetable {
    /// Scheduled entries, in placement order.
    pub entries: Vec<ScheduledEntry>,
    /// Conflicts detected for this timetable.
    pub conflicts: Vec<Conflict>,
}

impl Timetable {
    /// Whether no error-severity conflict is present.
    pub fn is_publishable(&self) -> bool {
        !self.conflicts.iter().any(|c| c.severity == Severity::Error)
    }

    /// Theory periods scheduled for a subject (special classes excluded).
    pub fn theory_periods(&self, subject_id: &str) -> u32 {
        self.entries_for_subject(subject_id)
            .filter(|e| !e.is_lab && !e.is_special())
            .count() as u32
    }

    /// Lab sessions scheduled for a subject (two entries per session).
    pub fn lab_sessions(&self, subject_id: &str) -> u32 {
        let lab_entries = self
            .entries_for_subject(subject_id)
            .filter(|e| e.is_lab)
            .count() as u32;
        lab_entries / 2
    }

    fn entries_for_subject<'a>(&'a self, subject_id: &'a str) -> impl Iterator<Item = &'a ScheduledEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.subject_id.as_deref() == Some(subject_id))
    }

    /// Teaching minutes per (teacher, day).
    pub fn teacher_minutes(&self) -> HashMap<(String, Weekday), u32> {
        let mut minutes: HashMap<(String, Weekday), u32> = HashMap::new();
        for e in &self.entries {
            if let Some(t) = &e.teacher_id {
                *minutes.entry((t.clone(), e.day)).or_insert(0) += e.duration_minutes;
            }
        }
        minutes
    }

    /// Distinct (day, slot) pairs holding a non-amenity entry.
    pub fn occupied_slot_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.is_amenity())
            .map(|e| (e.day, e.time_slot_id.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}
