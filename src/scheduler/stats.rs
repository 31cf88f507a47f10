//! Timetable summary statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total slots | Non-break cells on working days |
//! | Scheduled slots | Distinct cells holding a teaching entry |
//! | Utilization | scheduled / total, in percent |
//! | Requirements met | Requirements with every period placed |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Conflict, ScheduledEntry, Timetable};

/// Summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableStatistics {
    /// Non-break cells available across working days.
    pub total_slots: usize,
    /// Cells holding a theory, lab or special entry.
    pub scheduled_slots: usize,
    /// `scheduled_slots / total_slots` as a percentage (0.0..100.0).
    pub utilization_percent: f64,
    /// Conflicts reported.
    pub conflict_count: usize,
    /// Teachers appearing in the timetable.
    pub distinct_teachers: usize,
    /// Rooms appearing in the timetable.
    pub distinct_classrooms: usize,
    pub theory_entries: usize,
    pub lab_entries: usize,
    pub special_entries: usize,
    pub break_entries: usize,
    pub lunch_entries: usize,
    /// Requirements fully placed.
    pub requirements_met: usize,
    /// Requirements derived for the batch.
    pub requirements_total: usize,
    /// Whether the allocator stopped on its search budget.
    pub budget_exhausted: bool,
    /// Candidate slots the allocator examined.
    pub search_steps: u64,
}

impl TimetableStatistics {
    /// Computes statistics for a finished run.
    ///
    /// # Arguments
    /// * `entries` - Final entries, amenities included.
    /// * `conflicts` - Final conflict list.
    /// * `total_slots` - Non-break cells in the grid.
    /// * `placed` / `required` - Periods placed and required per requirement.
    pub fn calculate(
        entries: &[ScheduledEntry],
        conflicts: &[Conflict],
        total_slots: usize,
        placed: &[u32],
        required: &[u32],
    ) -> Self {
        let timetable = Timetable {
            entries: entries.to_vec(),
            conflicts: conflicts.to_vec(),
        };
        let scheduled_slots = timetable.occupied_slot_count();

        let utilization_percent = if total_slots == 0 {
            0.0
        } else {
            scheduled_slots as f64 / total_slots as f64 * 100.0
        };

        let distinct_teachers = entries
            .iter()
            .filter_map(|e| e.teacher_id.as_deref())
            .collect::<HashSet<_>>()
            .len();
        let distinct_classrooms = entries
            .iter()
            .filter_map(|e| e.classroom_id.as_deref())
            .collect::<HashSet<_>>()
            .len();

        let count = |pred: fn(&ScheduledEntry) -> bool| entries.iter().filter(|e| pred(e)).count();

        let requirements_met = placed
            .iter()
            .zip(required)
            .filter(|(p, r)| p >= r)
            .count();

        Self {
            total_slots,
            scheduled_slots,
            utilization_percent,
            conflict_count: timetable.conflicts.len(),
            distinct_teachers,
            distinct_classrooms,
            theory_entries: count(|e| !e.is_lab && !e.is_amenity() && !e.is_special()),
            lab_entries: count(|e| e.is_lab),
            special_entries: count(|e| e.is_special()),
            break_entries: count(|e| e.is_break),
            lunch_entries: count(|e| e.is_lunch),
            requirements_met,
            requirements_total: required.len(),
            budget_exhausted: false,
            search_steps: 0,
        }
    }

    /// Records the allocator's search effort.
    pub fn with_search(mut self, steps: u64, budget_exhausted: bool) -> Self {
        self.search_steps = steps;
        self.budget_exhausted = budget_exhausted;
        self
    }

    /// Whether every requirement was fully placed.
    pub fn all_requirements_met(&self) -> bool {
        self.requirements_met == self.requirements_total
    }
}
