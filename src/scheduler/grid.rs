//! Run-local slot grid.
//!
//! Owns every piece of mutable state of one generation run: the batch's
//! occupied cells, teacher and room bookings, and the per-(teacher, day)
//! minute accumulator. Nothing here is shared between runs, so runs for
//! different batches can execute concurrently without locking.

use std::collections::{HashMap, HashSet};

use chrono::Weekday;

use super::EngineConfig;
use crate::models::{gap_minutes, sort_chronologically, ScheduledEntry, TimeSlot};

type Cell = (Weekday, String);
type Booking = (String, Weekday, String);

/// Occupancy state for one run.
#[derive(Debug, Clone)]
pub struct SlotGrid<'a> {
    /// Working days with at least one slot, in configured order.
    days: Vec<Weekday>,
    /// All slots per working day (breaks included), chronological.
    slots_by_day: HashMap<Weekday, Vec<&'a TimeSlot>>,
    slots_by_id: HashMap<&'a str, &'a TimeSlot>,
    /// Cells of the batch timetable already holding an entry.
    batch_cells: HashSet<Cell>,
    teacher_bookings: HashSet<Booking>,
    classroom_bookings: HashSet<Booking>,
    teacher_minutes: HashMap<(String, Weekday), u32>,
    /// Entries this batch already had before the run.
    kept: Vec<ScheduledEntry>,
    entries: Vec<ScheduledEntry>,
    gap_tolerance: u32,
}

impl<'a> SlotGrid<'a> {
    /// Builds an empty grid over the working-day slots.
    pub fn new(slots: &'a [TimeSlot], config: &EngineConfig) -> Self {
        let mut slots_by_day: HashMap<Weekday, Vec<&'a TimeSlot>> = HashMap::new();
        for slot in slots.iter().filter(|s| config.is_working_day(s.day)) {
            slots_by_day.entry(slot.day).or_default().push(slot);
        }
        for day_slots in slots_by_day.values_mut() {
            sort_chronologically(day_slots);
        }
        let days = config
            .working_days
            .iter()
            .copied()
            .filter(|d| slots_by_day.contains_key(d))
            .collect();

        Self {
            days,
            slots_by_id: slots_by_day
                .values()
                .flatten()
                .copied()
                .map(|s: &'a TimeSlot| (s.id.as_str(), s))
                .collect(),
            slots_by_day,
            batch_cells: HashSet::new(),
            teacher_bookings: HashSet::new(),
            classroom_bookings: HashSet::new(),
            teacher_minutes: HashMap::new(),
            kept: Vec::new(),
            entries: Vec::new(),
            gap_tolerance: config.lab_gap_tolerance_minutes,
        }
    }

    /// Working days that have slots.
    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Looks up a working-day slot.
    pub fn slot(&self, id: &str) -> Option<&'a TimeSlot> {
        self.slots_by_id.get(id).copied()
    }

    /// All slots of a day, chronological, fixed breaks included.
    pub fn day_slots(&self, day: Weekday) -> &[&'a TimeSlot] {
        self.slots_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-break slots of a day, chronological.
    pub fn teaching_slots(&self, day: Weekday) -> Vec<&'a TimeSlot> {
        self.day_slots(day)
            .iter()
            .copied()
            .filter(|s| !s.is_break)
            .collect()
    }

    /// Non-break slots of a day not yet holding a batch entry.
    pub fn free_teaching_slots(&self, day: Weekday) -> Vec<&'a TimeSlot> {
        self.day_slots(day)
            .iter()
            .copied()
            .filter(|s| !s.is_break && self.is_cell_free(day, &s.id))
            .collect()
    }

    /// Total non-break cells across working days.
    pub fn teaching_slot_count(&self) -> usize {
        self.days.iter().map(|d| self.teaching_slots(*d).len()).sum()
    }

    /// Whether the batch has nothing in this cell.
    pub fn is_cell_free(&self, day: Weekday, slot_id: &str) -> bool {
        !self.batch_cells.contains(&(day, slot_id.to_string()))
    }

    /// Whether the teacher has no booking in this cell.
    pub fn is_teacher_free(&self, teacher_id: &str, day: Weekday, slot_id: &str) -> bool {
        !self
            .teacher_bookings
            .contains(&(teacher_id.to_string(), day, slot_id.to_string()))
    }

    /// Whether the room has no booking in this cell.
    pub fn is_classroom_free(&self, classroom_id: &str, day: Weekday, slot_id: &str) -> bool {
        !self
            .classroom_bookings
            .contains(&(classroom_id.to_string(), day, slot_id.to_string()))
    }

    /// Minutes already booked for a teacher on a day.
    pub fn teacher_minutes(&self, teacher_id: &str, day: Weekday) -> u32 {
        self.teacher_minutes
            .get(&(teacher_id.to_string(), day))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `b` directly follows `a` within the gap tolerance.
    pub fn are_adjacent(&self, a: &TimeSlot, b: &TimeSlot) -> bool {
        let gap = gap_minutes(a.end, b.start);
        a.day == b.day && gap >= 0 && gap <= i64::from(self.gap_tolerance)
    }

    /// Records a booking made by another batch.
    ///
    /// Blocks the teacher and room and counts toward the teacher's daily
    /// minutes, but does not occupy this batch's cell or join the output.
    pub fn reserve_external(&mut self, entry: &ScheduledEntry) {
        self.book_resources(entry);
    }

    /// Records an entry this batch already holds from an earlier run.
    ///
    /// Occupies the cell and books its resources like [`place`](Self::place),
    /// but stays out of the run's output.
    pub fn keep_existing(&mut self, entry: ScheduledEntry) {
        self.batch_cells
            .insert((entry.day, entry.time_slot_id.clone()));
        self.book_resources(&entry);
        self.kept.push(entry);
    }

    /// Places an entry for this batch.
    pub fn place(&mut self, entry: ScheduledEntry) {
        self.batch_cells
            .insert((entry.day, entry.time_slot_id.clone()));
        self.book_resources(&entry);
        self.entries.push(entry);
    }

    fn book_resources(&mut self, entry: &ScheduledEntry) {
        if let Some(t) = &entry.teacher_id {
            self.teacher_bookings
                .insert((t.clone(), entry.day, entry.time_slot_id.clone()));
            *self
                .teacher_minutes
                .entry((t.clone(), entry.day))
                .or_insert(0) += entry.duration_minutes;
        }
        if let Some(c) = &entry.classroom_id {
            self.classroom_bookings
                .insert((c.clone(), entry.day, entry.time_slot_id.clone()));
        }
    }

    /// Entries placed so far.
    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    /// Kept entries followed by the ones placed in this run.
    pub fn all_entries(&self) -> impl Iterator<Item = &ScheduledEntry> {
        self.kept.iter().chain(&self.entries)
    }

    /// Consumes the grid, returning the placed entries.
    pub fn into_entries(self) -> Vec<ScheduledEntry> {
        self.entries
    }
}
