//! Timetable generation engine for academic batches.
//!
//! Assigns subjects to (teacher, classroom, time slot) triples for one
//! student batch. Hard constraints (no double-booking, adjacent lab pairs,
//! daily teacher caps, availability and leave, fixed special classes) hold
//! by construction. Weekly period counts are best-effort and reported as
//! conflicts when short.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Teacher`, `Subject`, `Classroom`,
//!   `TimeSlot`, `FacultyAvailability`, `FacultyLeave`, `SpecialClass`,
//!   `ScheduledEntry`, `Conflict`, `Timetable`
//! - **`validation`**: Input integrity checks (missing categories, duplicate
//!   IDs, unassigned teachers, inverted windows)
//! - **`scheduler`**: Requirement derivation, special-class placement, the
//!   slot allocator, amenity insertion and the [`TimetableEngine`](scheduler::TimetableEngine)
//! - **`conflicts`**: Independent re-validation of a finished timetable
//! - **`store`**: Input source and persistence sink traits, with an
//!   in-memory implementation
//!
//! # Example
//!
//! ```
//! use chrono::Weekday;
//! use u_timetable::models::{Classroom, Subject, Teacher, TimeSlot};
//! use u_timetable::scheduler::{BatchKey, EngineConfig, GenerationConstraints, TimetableEngine, TimetableInput};
//!
//! let input = TimetableInput::new()
//!     .with_teacher(Teacher::new("T1"))
//!     .with_classroom(Classroom::lecture("R1"))
//!     .with_time_slots([
//!         TimeSlot::parse("MON-1", Weekday::Mon, "09:00", "10:00").unwrap(),
//!         TimeSlot::parse("MON-2", Weekday::Mon, "10:00", "11:00").unwrap(),
//!     ])
//!     .with_subject(Subject::new("CS101").for_batch("CSE", 3).with_hours(2).with_teacher("T1"));
//!
//! let constraints = GenerationConstraints::new(BatchKey::new("CSE", 3), "2026-27");
//! let result = TimetableEngine::new(EngineConfig::default().with_seed(1)).generate(&constraints, &input);
//! assert!(result.success);
//! assert_eq!(result.statistics.theory_entries, 2);
//! ```

pub mod conflicts;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

#[cfg(test)]
mod logging;

pub use error::{Result, TimetableError};
