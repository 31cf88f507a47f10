//! Timetabling domain models.
//!
//! Provides the read-only input records (teachers, subjects, rooms,
//! slots, availability, leave, special classes) and the engine's
//! output types (entries, conflicts, timetable).
//!
//! # Domain Mappings
//!
//! | u-timetable | Generic scheduling |
//! |-------------|--------------------|
//! | Subject requirement | Task |
//! | Period / lab session | Activity |
//! | Teacher, Classroom | Resource |
//! | TimeSlot | Time bucket |
//! | Timetable | Schedule |

mod availability;
mod classroom;
mod clock;
mod conflict;
mod entry;
mod special_class;
mod subject;
mod teacher;
mod time_slot;
mod timetable;

pub use availability::{FacultyAvailability, FacultyLeave, LeaveSpan, LeaveStatus, TeacherCalendar};
pub use classroom::{Classroom, RoomType};
pub use clock::{gap_minutes, minutes_of_day, parse_clock, ClockWindow};
pub use conflict::{dedup_conflicts, Conflict, ConflictType, Severity};
pub use entry::ScheduledEntry;
pub use special_class::SpecialClass;
pub use subject::Subject;
pub use teacher::Teacher;
pub use time_slot::{sort_chronologically, TimeSlot};
pub use timetable::Timetable;
