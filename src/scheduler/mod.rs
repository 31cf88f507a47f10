//! Timetable generation.
//!
//! # Pipeline
//!
//! 1. **Requirements**: each batch subject yields theory periods and lab
//!    sessions (`requirements`).
//! 2. **Special classes**: fixed-time entries claim their slots first
//!    (`special`).
//! 3. **Allocation**: a greedy constraint-checking allocator places lab
//!    pairs, then theory periods (`allocator`), over a run-local
//!    occupancy grid (`grid`).
//! 4. **Amenities**: best-effort breaks and lunch (`amenities`).
//! 5. **Validation**: an independent re-scan reports conflicts
//!    ([`crate::conflicts`]), and summary statistics are computed (`stats`).
//!
//! [`TimetableEngine`] drives the pipeline and tracks the [`RunState`].
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod allocator;
mod amenities;
mod config;
mod engine;
mod grid;
mod input;
mod requirements;
mod special;
mod stats;

pub use allocator::{AllocationOutcome, SlotAllocator};
pub use amenities::{insert_amenities, insert_breaks, insert_lunch, AmenityCounts};
pub use config::{BatchKey, BudgetMeter, DayOrder, EngineConfig, GenerationConstraints, SearchBudget};
pub use engine::{GenerationResult, RunState, TimetableEngine};
pub use grid::SlotGrid;
pub use input::TimetableInput;
pub use requirements::{account_existing, build_requirements, lab_sessions, Requirement};
pub use special::place_special_classes;
pub use stats::TimetableStatistics;
