//! Break and lunch insertion.
//!
//! Best-effort post-processing: when a fitting empty slot exists it is
//! marked, otherwise nothing happens and no conflict is raised.
//!
//! # Breaks
//! Walk each day's teaching entries chronologically, summing the minutes
//! of back-to-back entries. Any slot lying strictly between two entries
//! ends the stretch and restarts the sum. When the stretch had reached the
//! threshold and no fixed break lies in that gap, its first free slot
//! becomes a break.
//!
//! # Lunch
//! On every day with teaching, the first free slot lying inside the lunch
//! band becomes lunch.

use std::collections::HashSet;

use tracing::debug;

use super::grid::SlotGrid;
use super::EngineConfig;
use crate::models::{ScheduledEntry, TimeSlot};

/// Counts of inserted amenities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmenityCounts {
    pub breaks: usize,
    pub lunches: usize,
}

/// Inserts breaks, then lunch, on every working day.
pub fn insert_amenities(grid: &mut SlotGrid<'_>, config: &EngineConfig) -> AmenityCounts {
    let breaks = insert_breaks(grid, config);
    let lunches = insert_lunch(grid, config);
    debug!(breaks, lunches, "amenities inserted");
    AmenityCounts { breaks, lunches }
}

/// Inserts breaks after long continuous stretches.
pub fn insert_breaks(grid: &mut SlotGrid<'_>, config: &EngineConfig) -> usize {
    let mut chosen: Vec<&TimeSlot> = Vec::new();

    for &day in grid.days() {
        let taught_ids: HashSet<&str> = grid
            .all_entries()
            .filter(|e| e.day == day && !e.is_amenity())
            .map(|e| e.time_slot_id.as_str())
            .collect();
        let day_slots = grid.day_slots(day);
        let taught: Vec<&TimeSlot> = day_slots
            .iter()
            .copied()
            .filter(|s| !s.is_break && taught_ids.contains(s.id.as_str()))
            .collect();

        let mut continuous = 0u32;
        for (i, slot) in taught.iter().enumerate() {
            continuous += slot.duration_minutes;
            let Some(next) = taught.get(i + 1) else {
                break;
            };
            let between: Vec<&TimeSlot> = day_slots
                .iter()
                .copied()
                .filter(|s| s.start >= slot.end && s.end <= next.start)
                .collect();
            if between.is_empty() {
                continue;
            }

            // Any slot between two taught ones already interrupts the stretch.
            let has_fixed_break = between.iter().any(|s| s.is_break);
            if continuous >= config.break_threshold_minutes && !has_fixed_break {
                if let Some(free) = between.into_iter().find(|s| grid.is_cell_free(day, &s.id)) {
                    chosen.push(free);
                }
            }
            continuous = 0;
        }
    }

    let count = chosen.len();
    for slot in chosen {
        grid.place(ScheduledEntry::amenity(slot, false));
    }
    count
}

/// Inserts one lunch slot per teaching day inside the lunch band.
pub fn insert_lunch(grid: &mut SlotGrid<'_>, config: &EngineConfig) -> usize {
    let mut chosen: Vec<&TimeSlot> = Vec::new();

    for &day in grid.days() {
        let has_teaching = grid.all_entries().any(|e| e.day == day && !e.is_amenity());
        let has_lunch = grid.all_entries().any(|e| e.day == day && e.is_lunch);
        if !has_teaching || has_lunch {
            continue;
        }
        if let Some(slot) = grid.day_slots(day).iter().copied().find(|s| {
            !s.is_break && config.lunch_window.covers(&s.window()) && grid.is_cell_free(day, &s.id)
        }) {
            chosen.push(slot);
        }
    }

    let count = chosen.len();
    for slot in chosen {
        grid.place(ScheduledEntry::amenity(slot, true));
    }
    count
}
