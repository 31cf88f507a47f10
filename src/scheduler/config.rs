//! Generation constraints and engine tuning.
//!
//! [`GenerationConstraints`] is what a caller asks for (which batch, which
//! optional features). [`EngineConfig`] holds the knobs that stay fixed
//! for an institution: working days, lab gap tolerance, break threshold,
//! lunch band, day ordering and the search budget.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::ClockWindow;

/// Identifies the student batch a timetable is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchKey {
    /// Department code (e.g., "CSE").
    pub department: String,
    /// Semester number.
    pub semester: u32,
    /// Section within the semester, if the batch is split.
    #[serde(default)]
    pub section: Option<String>,
}

impl BatchKey {
    /// Creates a batch key without a section.
    pub fn new(department: impl Into<String>, semester: u32) -> Self {
        Self {
            department: department.into(),
            semester,
            section: None,
        }
    }

    /// Sets the section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-S{}", self.department, self.semester)?;
        if let Some(section) = &self.section {
            write!(f, "-{section}")?;
        }
        Ok(())
    }
}

/// Caller-facing generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConstraints {
    /// Target batch.
    pub batch: BatchKey,
    /// Students in the batch. Rooms below this capacity are skipped.
    #[serde(default)]
    pub strength: Option<u32>,
    /// Academic year label (e.g., "2026-27").
    pub academic_year: String,
    /// Run-wide daily cap; each teacher's own cap may be lower.
    pub max_teacher_hours_per_day: u32,
    /// Insert breaks and lunch after allocation.
    pub include_lunch_break: bool,
    /// Enforce availability windows and approved leave.
    pub respect_faculty_availability: bool,
    /// Place special classes before allocation.
    pub include_special_classes: bool,
    /// Replace the batch's stored timetable instead of adding to it.
    pub clear_existing: bool,
}

impl GenerationConstraints {
    /// Creates constraints with every optional feature enabled.
    pub fn new(batch: BatchKey, academic_year: impl Into<String>) -> Self {
        Self {
            batch,
            strength: None,
            academic_year: academic_year.into(),
            max_teacher_hours_per_day: 6,
            include_lunch_break: true,
            respect_faculty_availability: true,
            include_special_classes: true,
            clear_existing: true,
        }
    }

    /// Sets the batch strength.
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Sets the run-wide daily cap.
    pub fn with_max_teacher_hours(mut self, hours: u32) -> Self {
        self.max_teacher_hours_per_day = hours;
        self
    }

    /// Toggles break and lunch insertion.
    pub fn with_lunch_break(mut self, enabled: bool) -> Self {
        self.include_lunch_break = enabled;
        self
    }

    /// Toggles availability and leave enforcement.
    pub fn with_faculty_availability(mut self, enabled: bool) -> Self {
        self.respect_faculty_availability = enabled;
        self
    }

    /// Toggles special class placement.
    pub fn with_special_classes(mut self, enabled: bool) -> Self {
        self.include_special_classes = enabled;
        self
    }

    /// Toggles clearing the stored timetable.
    pub fn with_clear_existing(mut self, enabled: bool) -> Self {
        self.clear_existing = enabled;
        self
    }
}

/// Order in which working days are tried for each requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DayOrder {
    /// Shuffle per requirement. A seed makes runs reproducible.
    Shuffled { seed: Option<u64> },
    /// Always use this order (days outside the working set are ignored).
    Fixed(Vec<Weekday>),
}

impl Default for DayOrder {
    fn default() -> Self {
        Self::Shuffled { seed: None }
    }
}

/// Bounds on the allocator's search.
///
/// One step is one candidate slot examined. The deadline is measured from
/// the start of allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBudget {
    /// Maximum candidate slots examined.
    pub max_steps: Option<u64>,
    /// Wall-clock limit.
    pub deadline: Option<Duration>,
}

impl SearchBudget {
    /// No limits.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limits the number of steps.
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Limits wall-clock time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Starts a meter for one allocation run.
    pub fn start(&self) -> BudgetMeter {
        BudgetMeter {
            budget: *self,
            started: Instant::now(),
            steps: 0,
            exhausted: false,
        }
    }
}

/// Running step/time counter for one allocation.
#[derive(Debug, Clone)]
pub struct BudgetMeter {
    budget: SearchBudget,
    started: Instant,
    steps: u64,
    exhausted: bool,
}

impl BudgetMeter {
    /// Records one step. Returns `false` once the budget is spent.
    pub fn tick(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        self.steps += 1;
        let over_steps = self.budget.max_steps.is_some_and(|max| self.steps > max);
        let over_time = self
            .budget
            .deadline
            .is_some_and(|limit| self.started.elapsed() >= limit);
        if over_steps || over_time {
            self.exhausted = true;
        }
        !self.exhausted
    }

    /// Whether the budget has been spent.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Steps recorded so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Institution-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Days that receive periods.
    pub working_days: Vec<Weekday>,
    /// Largest gap (minutes) between two slots still treated as adjacent.
    pub lab_gap_tolerance_minutes: u32,
    /// Continuous teaching (minutes) after which a break is wanted.
    pub break_threshold_minutes: u32,
    /// Band in which one lunch slot is sought.
    pub lunch_window: ClockWindow,
    /// Day ordering strategy.
    pub day_order: DayOrder,
    /// Allocator search limits.
    pub budget: SearchBudget,
    /// Monday of the week being planned, for dated leave.
    pub reference_week: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
            lab_gap_tolerance_minutes: 10,
            break_threshold_minutes: 180,
            lunch_window: ClockWindow::new(clock(12, 0), clock(13, 30)),
            day_order: DayOrder::default(),
            budget: SearchBudget::unlimited(),
            reference_week: None,
        }
    }
}

impl EngineConfig {
    /// Sets the working days.
    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = days;
        self
    }

    /// Sets the lab gap tolerance.
    pub fn with_lab_gap_tolerance(mut self, minutes: u32) -> Self {
        self.lab_gap_tolerance_minutes = minutes;
        self
    }

    /// Sets the break threshold.
    pub fn with_break_threshold(mut self, minutes: u32) -> Self {
        self.break_threshold_minutes = minutes;
        self
    }

    /// Sets the lunch band.
    pub fn with_lunch_window(mut self, window: ClockWindow) -> Self {
        self.lunch_window = window;
        self
    }

    /// Sets the day order.
    pub fn with_day_order(mut self, order: DayOrder) -> Self {
        self.day_order = order;
        self
    }

    /// Shorthand for a seeded shuffle.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_day_order(DayOrder::Shuffled { seed: Some(seed) })
    }

    /// Sets the search budget.
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the reference week.
    pub fn with_reference_week(mut self, monday: NaiveDate) -> Self {
        self.reference_week = Some(monday);
        self
    }

    /// Whether `day` is a working day.
    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }
}

fn clock(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}
