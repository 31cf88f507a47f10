//! Greedy constraint-based slot allocator.
//!
//! # Algorithm
//!
//! 1. Take requirements in order (labs first, larger first).
//! 2. For each requirement, visit working days in a shuffled (or fixed)
//!    order, with the teacher's preferred days moved to the front.
//! 3. On each day, place as many periods as still needed before moving on.
//!    - Theory: walk free non-break slots chronologically.
//!    - Lab: walk free non-break slots looking for adjacent pairs; after a
//!      pair is placed, continue after its second slot.
//! 4. A candidate is accepted only if the teacher and a room both pass
//!    the constraint predicate. Nothing is ever double-booked.
//! 5. A requirement still short after all days yields an
//!    `INSUFFICIENT_PERIODS` warning; allocation moves on.
//!
//! # Constraint predicate
//! A slot set is valid for a teacher iff no slot is on the teacher's
//! unavailable list, each slot is available per the teacher's calendar
//! (when enforcement is on), the teacher has no booking in any slot, and
//! booked minutes plus the set's duration stay within the daily cap.
//! A slot set is valid for a room iff the room has no booking in any slot.
//!
//! # Complexity
//! O(r * d * s * c) where r=requirements, d=days, s=slots/day, c=rooms.
//! Bounded further by the optional [`SearchBudget`](super::SearchBudget).

use std::collections::HashMap;

use chrono::Weekday;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use super::config::{BudgetMeter, DayOrder, EngineConfig, GenerationConstraints};
use super::grid::SlotGrid;
use super::input::TimetableInput;
use super::requirements::Requirement;
use crate::models::{
    Classroom, Conflict, RoomType, ScheduledEntry, Teacher, TeacherCalendar, TimeSlot,
};

/// Result of one allocation pass.
#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    /// Requirements left short.
    pub shortfalls: Vec<Conflict>,
    /// Periods held per requirement after the pass (kept ones included),
    /// in requirement order.
    pub placed: Vec<u32>,
    /// Whether the search budget ran out.
    pub budget_exhausted: bool,
    /// Candidate slots examined.
    pub steps: u64,
}

/// Places theory periods and lab sessions into a [`SlotGrid`].
pub struct SlotAllocator<'a> {
    teachers: HashMap<&'a str, &'a Teacher>,
    calendars: HashMap<&'a str, TeacherCalendar<'a>>,
    classrooms: &'a [Classroom],
    constraints: &'a GenerationConstraints,
    config: &'a EngineConfig,
    rng: SmallRng,
}

impl<'a> SlotAllocator<'a> {
    /// Creates an allocator for one run.
    pub fn new(
        input: &'a TimetableInput,
        constraints: &'a GenerationConstraints,
        config: &'a EngineConfig,
    ) -> Self {
        let teachers: HashMap<&str, &Teacher> =
            input.teachers.iter().map(|t| (t.id.as_str(), t)).collect();
        let calendars = input
            .teachers
            .iter()
            .map(|t| {
                (
                    t.id.as_str(),
                    TeacherCalendar::for_teacher(
                        &t.id,
                        &input.availability,
                        &input.leaves,
                        config.reference_week,
                    ),
                )
            })
            .collect();
        let rng = match &config.day_order {
            DayOrder::Shuffled { seed: Some(seed) } => SmallRng::seed_from_u64(*seed),
            _ => SmallRng::from_os_rng(),
        };

        Self {
            teachers,
            calendars,
            classrooms: &input.classrooms,
            constraints,
            config,
            rng,
        }
    }

    /// Allocates every requirement in order.
    pub fn allocate(&mut self, grid: &mut SlotGrid<'a>, requirements: &[Requirement]) -> AllocationOutcome {
        let mut meter = self.config.budget.start();
        let mut outcome = AllocationOutcome::default();

        for req in requirements {
            let placed = req.periods_scheduled + self.allocate_requirement(grid, req, &mut meter);
            outcome.placed.push(placed);

            if placed < req.periods_required {
                warn!(
                    subject = %req.subject_id,
                    is_lab = req.is_lab,
                    placed,
                    required = req.periods_required,
                    "requirement under-filled"
                );
                outcome.shortfalls.push(Conflict::insufficient_periods(
                    &req.subject_id,
                    req.is_lab,
                    placed,
                    req.periods_required,
                ));
            } else {
                debug!(subject = %req.subject_id, is_lab = req.is_lab, placed, "requirement filled");
            }
        }

        outcome.budget_exhausted = meter.is_exhausted();
        outcome.steps = meter.steps();
        if outcome.budget_exhausted {
            warn!(steps = outcome.steps, "search budget exhausted, remaining periods left unplaced");
        }
        outcome
    }

    fn allocate_requirement(
        &mut self,
        grid: &mut SlotGrid<'a>,
        req: &Requirement,
        meter: &mut BudgetMeter,
    ) -> u32 {
        let target = req.periods_outstanding();
        if target == 0 {
            return 0;
        }
        let mut placed = 0;
        for day in self.day_order(grid, &req.teacher_id) {
            if placed >= target || meter.is_exhausted() {
                break;
            }
            let remaining = target - placed;
            placed += if req.is_lab {
                self.fill_labs(grid, req, day, remaining, meter)
            } else {
                self.fill_theory(grid, req, day, remaining, meter)
            };
        }
        placed
    }

    /// Day visiting order for one requirement.
    fn day_order(&mut self, grid: &SlotGrid<'a>, teacher_id: &str) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = match &self.config.day_order {
            DayOrder::Fixed(order) => order
                .iter()
                .copied()
                .filter(|d| grid.days().contains(d))
                .collect(),
            DayOrder::Shuffled { .. } => {
                let mut days = grid.days().to_vec();
                days.shuffle(&mut self.rng);
                days
            }
        };

        if let Some(teacher) = self.teachers.get(teacher_id) {
            if !teacher.preferred_days.is_empty() {
                // sort_by_key is stable
                days.sort_by_key(|d| !teacher.preferred_days.contains(d));
            }
        }
        days
    }

    fn fill_theory(
        &self,
        grid: &mut SlotGrid<'a>,
        req: &Requirement,
        day: Weekday,
        remaining: u32,
        meter: &mut BudgetMeter,
    ) -> u32 {
        let mut placed = 0;
        for slot in grid.free_teaching_slots(day) {
            if placed >= remaining || !meter.tick() {
                break;
            }
            if !self.teacher_accepts(grid, &req.teacher_id, &[slot]) {
                continue;
            }
            let Some(room) = self.pick_classroom(grid, req, &[slot]) else {
                continue;
            };
            grid.place(ScheduledEntry::theory(&req.subject_id, &req.teacher_id, &room.id, slot));
            placed += 1;
        }
        placed
    }

    fn fill_labs(
        &self,
        grid: &mut SlotGrid<'a>,
        req: &Requirement,
        day: Weekday,
        remaining: u32,
        meter: &mut BudgetMeter,
    ) -> u32 {
        let free = grid.free_teaching_slots(day);
        let mut placed = 0;
        let mut i = 0;
        while i + 1 < free.len() && placed < remaining {
            if !meter.tick() {
                break;
            }
            let pair = [free[i], free[i + 1]];
            if grid.are_adjacent(pair[0], pair[1]) && self.teacher_accepts(grid, &req.teacher_id, &pair) {
                if let Some(room) = self.pick_classroom(grid, req, &pair) {
                    for slot in pair {
                        grid.place(ScheduledEntry::lab(&req.subject_id, &req.teacher_id, &room.id, slot));
                    }
                    placed += 1;
                    i += 2;
                    continue;
                }
            }
            i += 1;
        }
        placed
    }

    /// Teacher side of the constraint predicate.
    pub fn teacher_accepts(&self, grid: &SlotGrid<'a>, teacher_id: &str, slots: &[&TimeSlot]) -> bool {
        let Some(teacher) = self.teachers.get(teacher_id) else {
            return false;
        };
        let Some(first) = slots.first() else {
            return false;
        };
        let day = first.day;

        for slot in slots {
            if teacher.is_slot_blocked(&slot.id) {
                return false;
            }
            if self.constraints.respect_faculty_availability {
                let available = self
                    .calendars
                    .get(teacher_id)
                    .map_or(true, |cal| cal.is_available(slot.day, &slot.window()));
                if !available {
                    return false;
                }
            }
            if !grid.is_teacher_free(teacher_id, slot.day, &slot.id) {
                return false;
            }
        }

        let candidate: u32 = slots.iter().map(|s| s.duration_minutes).sum();
        let cap = teacher.daily_cap_minutes(self.constraints.max_teacher_hours_per_day);
        grid.teacher_minutes(teacher_id, day) + candidate <= cap
    }

    /// Picks a free room of the right type for every slot in the set.
    ///
    /// Preference: same department, then smallest sufficient capacity.
    fn pick_classroom(&self, grid: &SlotGrid<'a>, req: &Requirement, slots: &[&TimeSlot]) -> Option<&'a Classroom> {
        let classrooms: &'a [Classroom] = self.classrooms;
        classrooms
            .iter()
            .filter(|room| {
                if req.is_lab {
                    room.room_type == RoomType::Lab
                } else {
                    room.room_type.hosts_theory()
                }
            })
            .filter(|room| room.fits(self.constraints.strength))
            .filter(|room| {
                slots
                    .iter()
                    .all(|s| grid.is_classroom_free(&room.id, s.day, &s.id))
            })
            .min_by_key(|room| (room.department != req.department, room.capacity))
    }
}
