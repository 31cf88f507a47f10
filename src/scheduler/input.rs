//! Read-only input snapshot for one generation run.

use serde::{Deserialize, Serialize};

use super::config::BatchKey;
use crate::models::{
    Classroom, FacultyAvailability, FacultyLeave, ScheduledEntry, SpecialClass, Subject, Teacher,
    TimeSlot,
};

/// Everything a run reads. Never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableInput {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub classrooms: Vec<Classroom>,
    pub time_slots: Vec<TimeSlot>,
    pub availability: Vec<FacultyAvailability>,
    pub leaves: Vec<FacultyLeave>,
    pub special_classes: Vec<SpecialClass>,
    /// Entries already booked by other batches. They block teachers and
    /// rooms but are not part of this run's output.
    pub external_bookings: Vec<ScheduledEntry>,
    /// The batch's own stored entries, kept when the run does not clear
    /// them. They occupy the batch's cells and count toward its periods.
    pub existing_entries: Vec<ScheduledEntry>,
}

impl TimetableInput {
    /// Creates an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    pub fn with_classroom(mut self, classroom: Classroom) -> Self {
        self.classrooms.push(classroom);
        self
    }

    pub fn with_time_slots(mut self, slots: impl IntoIterator<Item = TimeSlot>) -> Self {
        self.time_slots.extend(slots);
        self
    }

    pub fn with_availability(mut self, row: FacultyAvailability) -> Self {
        self.availability.push(row);
        self
    }

    pub fn with_leave(mut self, leave: FacultyLeave) -> Self {
        self.leaves.push(leave);
        self
    }

    pub fn with_special_class(mut self, special: SpecialClass) -> Self {
        self.special_classes.push(special);
        self
    }

    pub fn with_external_booking(mut self, entry: ScheduledEntry) -> Self {
        self.external_bookings.push(entry);
        self
    }

    pub fn with_existing_entry(mut self, entry: ScheduledEntry) -> Self {
        self.existing_entries.push(entry);
        self
    }

    /// Subjects taught to `batch`.
    pub fn subjects_for<'a>(&'a self, batch: &'a BatchKey) -> impl Iterator<Item = &'a Subject> + 'a {
        self.subjects
            .iter()
            .filter(move |s| s.department == batch.department && s.semester == batch.semester)
    }

    /// Looks up a teacher.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    /// Looks up a room.
    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.iter().find(|c| c.id == id)
    }

    /// Looks up a slot.
    pub fn time_slot(&self, id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == id)
    }
}
