//! Special class placement.
//!
//! Runs before allocation. Each special class claims the run of
//! consecutive teaching slots on its day that together contain its clock
//! window. Claimed cells are never reassigned. A class that cannot be
//! placed is skipped with an informational `SPECIAL_CLASS_CONFLICT`.
//! Classes the batch already holds from a kept timetable are left alone.

use tracing::{debug, info};

use super::grid::SlotGrid;
use super::input::TimetableInput;
use super::EngineConfig;
use crate::models::{Conflict, ScheduledEntry, SpecialClass, TimeSlot};

/// Places special classes in priority order (highest first).
///
/// Returns one conflict per class that could not be placed.
pub fn place_special_classes<'a>(
    grid: &mut SlotGrid<'a>,
    input: &TimetableInput,
    config: &EngineConfig,
) -> Vec<Conflict> {
    let mut ordered: Vec<&SpecialClass> = input.special_classes.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut conflicts = Vec::new();
    for special in ordered {
        let held = grid
            .all_entries()
            .any(|e| e.special_class_id.as_deref() == Some(special.id.as_str()));
        if held {
            debug!(special = %special.id, "special class already held");
            continue;
        }
        match claim_window(grid, special, input, config) {
            Ok(slots) => {
                let span = slots.len() as u32;
                for slot in &slots {
                    grid.place(special_entry(special, slot, span));
                }
                debug!(special = %special.id, day = ?special.day, span, "special class placed");
            }
            Err(reason) => {
                info!(special = %special.id, reason = reason.as_str(), "special class skipped");
                conflicts.push(Conflict::special_class_conflict(&special.id, reason));
            }
        }
    }
    conflicts
}

/// Finds the slots a special class would occupy, or why it cannot.
fn claim_window<'a>(
    grid: &SlotGrid<'a>,
    special: &SpecialClass,
    input: &TimetableInput,
    config: &EngineConfig,
) -> Result<Vec<&'a TimeSlot>, String> {
    if !config.is_working_day(special.day) {
        return Err(format!("{:?} is not a working day", special.day));
    }
    if input.teacher(&special.teacher_id).is_none() {
        return Err(format!("unknown teacher '{}'", special.teacher_id));
    }
    if input.classroom(&special.classroom_id).is_none() {
        return Err(format!("unknown classroom '{}'", special.classroom_id));
    }

    let covering: Vec<&'a TimeSlot> = grid
        .teaching_slots(special.day)
        .into_iter()
        .filter(|s| s.window().overlaps(&special.window))
        .collect();

    let (Some(first), Some(last)) = (covering.first(), covering.last()) else {
        return Err("no time slot overlaps its window".to_string());
    };
    let contiguous = covering.windows(2).all(|w| grid.are_adjacent(w[0], w[1]));
    if first.start > special.window.start || last.end < special.window.end || !contiguous {
        return Err("no contiguous time slot window contains it".to_string());
    }

    for slot in &covering {
        if !grid.is_cell_free(slot.day, &slot.id) {
            return Err(format!("slot {} is already occupied", slot.id));
        }
        if !grid.is_teacher_free(&special.teacher_id, slot.day, &slot.id) {
            return Err(format!("teacher {} is busy in slot {}", special.teacher_id, slot.id));
        }
        if !grid.is_classroom_free(&special.classroom_id, slot.day, &slot.id) {
            return Err(format!("classroom {} is busy in slot {}", special.classroom_id, slot.id));
        }
    }
    Ok(covering)
}

fn special_entry(special: &SpecialClass, slot: &TimeSlot, span: u32) -> ScheduledEntry {
    ScheduledEntry {
        subject_id: special.subject_id.clone(),
        teacher_id: Some(special.teacher_id.clone()),
        classroom_id: Some(special.classroom_id.clone()),
        time_slot_id: slot.id.clone(),
        day: slot.day,
        is_lab: false,
        is_break: false,
        is_lunch: false,
        special_class_id: None,
        duration_minutes: slot.duration_minutes,
        consecutive_slots: 1,
    }
    .with_special(&special.id, span)
}
