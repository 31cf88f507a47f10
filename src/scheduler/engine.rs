//! Generation pipeline.
//!
//! # Run states
//!
//! ```text
//! LOADING -> PLACING_SPECIAL -> ALLOCATING -> INSERTING_BREAKS -> VALIDATING
//!     -> SUCCEEDED | SUCCEEDED_WITH_CONFLICTS
//! ```
//!
//! A fatal error moves any non-terminal state to FAILED. A failed run
//! produces no entries and persists nothing. There is no retry state.
//!
//! # Keeping a stored timetable
//! With `clear_existing = false` the batch's stored entries hold their
//! cells and count toward each subject's periods. The run only fills what
//! is still missing, and validation and statistics cover the whole batch
//! timetable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::allocator::SlotAllocator;
use super::amenities::insert_amenities;
use super::config::{EngineConfig, GenerationConstraints};
use super::grid::SlotGrid;
use super::input::TimetableInput;
use super::requirements::{account_existing, build_requirements};
use super::special::place_special_classes;
use super::stats::TimetableStatistics;
use crate::conflicts::ConflictValidator;
use crate::error::{Result, TimetableError};
use crate::models::{dedup_conflicts, Conflict, ScheduledEntry, Timetable};
use crate::store::{TimetableSink, TimetableSource};
use crate::validation::validate_input;

/// Stage of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Loading,
    PlacingSpecial,
    Allocating,
    InsertingBreaks,
    Validating,
    Succeeded,
    SucceededWithConflicts,
    Failed,
}

impl RunState {
    /// Whether the pipeline may move from `self` to `next`.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Loading, PlacingSpecial)
            | (PlacingSpecial, Allocating)
            | (Allocating, InsertingBreaks)
            | (InsertingBreaks, Validating)
            | (Validating, Succeeded)
            | (Validating, SucceededWithConflicts) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Whether the run has finished.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::SucceededWithConflicts | RunState::Failed
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Loading => write!(f, "LOADING"),
            RunState::PlacingSpecial => write!(f, "PLACING_SPECIAL"),
            RunState::Allocating => write!(f, "ALLOCATING"),
            RunState::InsertingBreaks => write!(f, "INSERTING_BREAKS"),
            RunState::Validating => write!(f, "VALIDATING"),
            RunState::Succeeded => write!(f, "SUCCEEDED"),
            RunState::SucceededWithConflicts => write!(f, "SUCCEEDED_WITH_CONFLICTS"),
            RunState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// `false` only when a fatal error aborted the run.
    pub success: bool,
    /// Final run state.
    pub state: RunState,
    /// Entries placed by this run, including breaks and lunch. Entries a
    /// run kept from the stored timetable are not repeated here.
    pub entries: Vec<ScheduledEntry>,
    /// Every conflict found, deduplicated.
    pub conflicts: Vec<Conflict>,
    pub statistics: TimetableStatistics,
    pub generated_at: DateTime<Utc>,
    /// Fatal error message for failed runs.
    pub error: Option<String>,
}

impl GenerationResult {
    fn failed(err: &TimetableError) -> Self {
        Self {
            success: false,
            state: RunState::Failed,
            entries: Vec::new(),
            conflicts: Vec::new(),
            statistics: TimetableStatistics::default(),
            generated_at: Utc::now(),
            error: Some(err.to_string()),
        }
    }

    /// Entries and conflicts as a [`Timetable`].
    pub fn timetable(&self) -> Timetable {
        Timetable {
            entries: self.entries.clone(),
            conflicts: self.conflicts.clone(),
        }
    }

    /// Whether the timetable can be published (no error-severity conflict).
    pub fn is_publishable(&self) -> bool {
        self.success && self.timetable().is_publishable()
    }
}

/// Timetable generation engine.
///
/// Holds only immutable configuration. Every run builds its own grid, so
/// one engine can serve concurrent runs for different batches.
#[derive(Debug, Clone, Default)]
pub struct TimetableEngine {
    config: EngineConfig,
}

impl TimetableEngine {
    /// Creates an engine.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates a timetable for one batch from an input snapshot.
    ///
    /// Never panics on bad input: fatal problems yield `success = false`
    /// with the error message and no entries.
    pub fn generate(&self, constraints: &GenerationConstraints, input: &TimetableInput) -> GenerationResult {
        let mut state = RunState::Loading;
        info!(batch = %constraints.batch, year = %constraints.academic_year, "timetable generation started");

        match self.try_generate(constraints, input, &mut state) {
            Ok(result) => {
                info!(
                    batch = %constraints.batch,
                    state = %result.state,
                    entries = result.entries.len(),
                    conflicts = result.conflicts.len(),
                    "timetable generation finished"
                );
                result
            }
            Err(err) => {
                error!(batch = %constraints.batch, stage = %state, error = %err, "timetable generation failed");
                advance(&mut state, RunState::Failed);
                GenerationResult::failed(&err)
            }
        }
    }

    /// Loads input, generates, and persists the result.
    ///
    /// Nothing is persisted when generation fails. Rows rejected by the
    /// sink are reported as `PERSISTENCE_CONFLICT`s on the returned result.
    pub fn run<S, K>(&self, constraints: &GenerationConstraints, source: &S, sink: &K) -> GenerationResult
    where
        S: TimetableSource + ?Sized,
        K: TimetableSink + ?Sized,
    {
        let input = match source.load(constraints) {
            Ok(input) => input,
            Err(err) => {
                error!(batch = %constraints.batch, error = %err, "input source failed");
                return GenerationResult::failed(&err);
            }
        };

        let mut result = self.generate(constraints, &input);
        if !result.success {
            return result;
        }

        match sink.persist(&constraints.batch, &result.entries, constraints.clear_existing) {
            Ok(rejected) if rejected.is_empty() => result,
            Ok(rejected) => {
                warn!(batch = %constraints.batch, rejected = rejected.len(), "some rows were not persisted");
                let mut conflicts = std::mem::take(&mut result.conflicts);
                conflicts.extend(rejected);
                result.conflicts = dedup_conflicts(conflicts);
                result.statistics.conflict_count = result.conflicts.len();
                result.state = RunState::SucceededWithConflicts;
                result
            }
            Err(err) => {
                error!(batch = %constraints.batch, error = %err, "persistence failed");
                GenerationResult::failed(&err)
            }
        }
    }

    fn try_generate(
        &self,
        constraints: &GenerationConstraints,
        input: &TimetableInput,
        state: &mut RunState,
    ) -> Result<GenerationResult> {
        validate_input(input, constraints, &self.config)?;
        let mut requirements = build_requirements(input.subjects_for(&constraints.batch))?;
        account_existing(&mut requirements, &input.existing_entries);
        debug!(
            requirements = requirements.len(),
            kept = input.existing_entries.len(),
            "requirements derived"
        );

        let mut grid = SlotGrid::new(&input.time_slots, &self.config);
        for booking in &input.external_bookings {
            grid.reserve_external(booking);
        }
        for kept in &input.existing_entries {
            grid.keep_existing(kept.clone());
        }

        advance(state, RunState::PlacingSpecial);
        let mut conflicts = if constraints.include_special_classes {
            place_special_classes(&mut grid, input, &self.config)
        } else {
            Vec::new()
        };

        advance(state, RunState::Allocating);
        let mut allocator = SlotAllocator::new(input, constraints, &self.config);
        let outcome = allocator.allocate(&mut grid, &requirements);
        conflicts.extend(outcome.shortfalls);

        advance(state, RunState::InsertingBreaks);
        if constraints.include_lunch_break {
            insert_amenities(&mut grid, &self.config);
        }

        advance(state, RunState::Validating);
        let total_slots = grid.teaching_slot_count();
        // The batch's whole timetable: kept entries plus this run's output.
        let timetable: Vec<ScheduledEntry> = grid.all_entries().cloned().collect();
        let entries = grid.into_entries();
        let validator = ConflictValidator::new(input, constraints, &self.config);
        conflicts.extend(validator.validate(&timetable, &requirements));
        let conflicts = dedup_conflicts(conflicts);

        let required: Vec<u32> = requirements.iter().map(|r| r.periods_required).collect();
        let statistics =
            TimetableStatistics::calculate(&timetable, &conflicts, total_slots, &outcome.placed, &required)
                .with_search(outcome.steps, outcome.budget_exhausted);

        let finished = if conflicts.is_empty() {
            RunState::Succeeded
        } else {
            RunState::SucceededWithConflicts
        };
        advance(state, finished);

        Ok(GenerationResult {
            success: true,
            state: finished,
            entries,
            conflicts,
            statistics,
            generated_at: Utc::now(),
            error: None,
        })
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(state.can_transition_to(next), "invalid run transition {state} -> {next}");
    debug!(from = %state, to = %next, "run state changed");
    *state = next;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Weekday;

    use super::*;
    use crate::models::{
        Classroom, ClockWindow, ConflictType, FacultyAvailability, Severity, SpecialClass, Subject,
        Teacher, TimeSlot,
    };
    use crate::scheduler::{BatchKey, DayOrder};
    use crate::store::InMemoryStore;

    const WEEK: [Weekday; 6] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    fn week_slots(per_day: u32) -> Vec<TimeSlot> {
        WEEK.iter()
            .flat_map(|&day| {
                (0..per_day).map(move |i| {
                    TimeSlot::parse(
                        format!("{day:?}-{}", i + 1),
                        day,
                        &format!("{:02}:00", 9 + i),
                        &format!("{:02}:00", 10 + i),
                    )
                    .unwrap()
                })
            })
            .collect()
    }

    fn constraints() -> GenerationConstraints {
        GenerationConstraints::new(BatchKey::new("CSE", 3), "2026-27")
    }

    fn fixed_engine() -> TimetableEngine {
        TimetableEngine::new(EngineConfig::default().with_day_order(DayOrder::Fixed(WEEK.to_vec())))
    }

    fn teaching(result: &GenerationResult) -> Vec<&ScheduledEntry> {
        result.entries.iter().filter(|e| !e.is_amenity()).collect()
    }

    fn of_type(result: &GenerationResult, kind: ConflictType) -> Vec<&Conflict> {
        result
            .conflicts
            .iter()
            .filter(|c| c.conflict_type == kind)
            .collect()
    }

    #[test]
    fn test_run_state_transitions() {
        assert!(RunState::Loading.can_transition_to(RunState::PlacingSpecial));
        assert!(RunState::Validating.can_transition_to(RunState::SucceededWithConflicts));
        assert!(RunState::Allocating.can_transition_to(RunState::Failed));
        assert!(!RunState::Loading.can_transition_to(RunState::Allocating));
        assert!(!RunState::Succeeded.can_transition_to(RunState::Failed));
        assert!(!RunState::Failed.can_transition_to(RunState::Loading));
        assert_eq!(RunState::SucceededWithConflicts.to_string(), "SUCCEEDED_WITH_CONFLICTS");
    }

    #[test]
    fn test_single_subject_gets_exact_periods() {
        crate::logging::init_test();
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(5))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(3).with_teacher("T1"));
        let engine = TimetableEngine::new(EngineConfig::default().with_seed(42));
        let result = engine.generate(&constraints().with_lunch_break(false), &input);

        assert!(result.success);
        assert_eq!(result.state, RunState::Succeeded);
        assert_eq!(result.entries.len(), 3);
        assert!(result.conflicts.is_empty());
        assert_eq!(result.statistics.total_slots, 30);
        assert_eq!(result.statistics.scheduled_slots, 3);
        assert!((result.statistics.utilization_percent - 10.0).abs() < 1e-10);
        assert_eq!(result.statistics.requirements_met, 1);
        assert!(result.is_publishable());
    }

    #[test]
    fn test_lab_room_taken_by_special_classes() {
        let mut input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_teacher(Teacher::new("T2"))
            .with_classroom(Classroom::lab("L1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(5))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_lab_hours(4).with_teacher("T1"));
        for day in WEEK {
            input = input.with_special_class(SpecialClass::new(
                format!("SP-{day:?}"),
                "T2",
                "L1",
                day,
                ClockWindow::parse("09:00", "14:00").unwrap(),
            ));
        }
        let result = fixed_engine().generate(&constraints(), &input);

        assert!(result.success);
        assert!(result.entries.iter().all(|e| !e.is_lab));
        assert_eq!(result.statistics.special_entries, 30);
        let shortfalls = of_type(&result, ConflictType::InsufficientPeriods);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].entity_ids, vec!["S1"]);
        assert_eq!(shortfalls[0].severity, Severity::Warning);
        assert_eq!(result.state, RunState::SucceededWithConflicts);
    }

    #[test]
    fn test_shared_teacher_single_slot_is_never_double_booked() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_classroom(Classroom::lecture("R2"))
            .with_time_slots(week_slots(5))
            .with_availability(FacultyAvailability::available(
                "T1",
                Weekday::Mon,
                ClockWindow::parse("09:00", "10:00").unwrap(),
            ))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(1).with_teacher("T1"))
            .with_subject(Subject::new("S2").for_batch("CSE", 3).with_hours(1).with_teacher("T1"));
        let result = fixed_engine().generate(&constraints(), &input);

        assert!(result.success);
        assert_eq!(teaching(&result).len(), 1);
        assert_eq!(of_type(&result, ConflictType::InsufficientPeriods).len(), 1);
        assert!(of_type(&result, ConflictType::TeacherConflict).is_empty());
    }

    #[test]
    fn test_daily_cap_moves_remainder_to_next_day() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1").with_max_hours_per_day(4))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(6))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(5).with_teacher("T1"));
        let result = fixed_engine().generate(&constraints().with_lunch_break(false), &input);

        let mon = teaching(&result).iter().filter(|e| e.day == Weekday::Mon).count();
        let tue = teaching(&result).iter().filter(|e| e.day == Weekday::Tue).count();
        assert_eq!((mon, tue), (4, 1));
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn test_amenities_follow_flag() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(6))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(2).with_teacher("T1"));

        let with = fixed_engine().generate(&constraints(), &input);
        assert_eq!(with.statistics.lunch_entries, 1);
        let lunch = with.entries.iter().find(|e| e.is_lunch).unwrap();
        assert_eq!(lunch.time_slot_id, "Mon-4"); // 12:00-13:00

        let without = fixed_engine().generate(&constraints().with_lunch_break(false), &input);
        assert!(without.entries.iter().all(|e| !e.is_amenity()));
    }

    #[test]
    fn test_special_classes_follow_flag() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(5))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(1).with_teacher("T1"))
            .with_special_class(SpecialClass::new(
                "SP1",
                "T1",
                "R1",
                Weekday::Mon,
                ClockWindow::parse("09:00", "10:00").unwrap(),
            ));

        let on = fixed_engine().generate(&constraints().with_lunch_break(false), &input);
        assert_eq!(on.statistics.special_entries, 1);
        assert_eq!(teaching(&on).len(), 2);

        let off = fixed_engine().generate(
            &constraints().with_lunch_break(false).with_special_classes(false),
            &input,
        );
        assert_eq!(off.statistics.special_entries, 0);
        assert_eq!(off.entries[0].time_slot_id, "Mon-1");
    }

    #[test]
    fn test_unassigned_teacher_fails_run() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(5))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(3));
        let result = fixed_engine().generate(&constraints(), &input);

        assert!(!result.success);
        assert_eq!(result.state, RunState::Failed);
        assert!(result.entries.is_empty());
        assert!(result.error.unwrap().contains("no assigned teacher"));
    }

    #[test]
    fn test_missing_entities_fail_run() {
        let result = fixed_engine().generate(&constraints(), &TimetableInput::new());
        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(message.contains("No teachers"));
        assert!(message.contains("No classrooms"));
    }

    #[test]
    fn test_generated_timetables_hold_invariants() {
        let mut input = TimetableInput::new()
            .with_classroom(Classroom::lecture("R1").with_department("CSE"))
            .with_classroom(Classroom::seminar("R2"))
            .with_classroom(Classroom::lab("L1").with_department("CSE"))
            .with_time_slots(week_slots(7));
        for t in 1..=4 {
            input = input.with_teacher(Teacher::new(format!("T{t}")).with_max_hours_per_day(3));
        }
        for (i, (hours, labs)) in [(4, 2), (3, 0), (5, 4), (2, 2), (4, 0), (3, 3)].iter().enumerate() {
            input = input.with_subject(
                Subject::new(format!("S{i}"))
                    .for_batch("CSE", 3)
                    .with_hours(*hours)
                    .with_lab_hours(*labs)
                    .with_teacher(format!("T{}", i % 4 + 1)),
            );
        }
        let constraints = constraints();

        for seed in [1, 7, 42, 1234] {
            let engine = TimetableEngine::new(EngineConfig::default().with_seed(seed));
            let result = engine.generate(&constraints, &input);
            assert!(result.success);
            let entries = teaching(&result);

            let mut teacher_cells = HashSet::new();
            let mut room_cells = HashSet::new();
            for e in &entries {
                assert!(teacher_cells.insert((e.teacher_id.clone(), e.day, e.time_slot_id.clone())));
                assert!(room_cells.insert((e.classroom_id.clone(), e.day, e.time_slot_id.clone())));
            }

            let timetable = result.timetable();
            for ((teacher, day), minutes) in timetable.teacher_minutes() {
                assert!(
                    minutes <= 180
                        || result.conflicts.iter().any(|c| c.conflict_type == ConflictType::TeacherOverload
                            && c.entity_ids.contains(&teacher)
                            && c.day == Some(day))
                );
            }

            let requirements =
                build_requirements(input.subjects_for(&constraints.batch)).unwrap();
            for req in &requirements {
                let scheduled = if req.is_lab {
                    timetable.lab_sessions(&req.subject_id)
                } else {
                    timetable.theory_periods(&req.subject_id)
                };
                assert!(
                    scheduled >= req.periods_required
                        || of_type(&result, ConflictType::InsufficientPeriods)
                            .iter()
                            .any(|c| c.entity_ids == vec![req.subject_id.clone()])
                );
            }

            assert!(of_type(&result, ConflictType::LabSequenceBroken).is_empty());
            assert!(of_type(&result, ConflictType::TeacherConflict).is_empty());
            assert!(of_type(&result, ConflictType::ClassroomConflict).is_empty());

            let validator = ConflictValidator::new(&input, &constraints, engine.config());
            let first = validator.validate(&result.entries, &requirements);
            let second = validator.validate(&result.entries, &requirements);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_run_persists_and_reports_clashes() {
        let catalog = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(2))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(2).with_teacher("T1"));
        let store = InMemoryStore::new(catalog);
        let engine = fixed_engine();
        let constraints = constraints().with_lunch_break(false);

        let result = engine.run(&constraints, &store, &store);
        assert!(result.success);
        assert_eq!(store.entries_for(&constraints.batch).unwrap().len(), 2);

        // Another batch sharing T1 is steered around the stored bookings
        let other = GenerationConstraints::new(BatchKey::new("CSE", 3).with_section("B"), "2026-27")
            .with_lunch_break(false);
        let result = engine.run(&other, &store, &store);
        assert!(result.success);
        assert_eq!(result.state, RunState::Succeeded);
        let stored = store.entries_for(&other.batch).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|e| e.day == Weekday::Tue));
    }

    fn assert_one_class_per_cell(entries: &[ScheduledEntry]) {
        let mut cells = HashSet::new();
        for e in entries {
            assert!(
                cells.insert((e.day, e.time_slot_id.clone())),
                "batch has two entries in {}",
                e.time_slot_id
            );
        }
    }

    #[test]
    fn test_rerun_keeping_timetable_adds_nothing_when_complete() {
        let catalog = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_teacher(Teacher::new("T2"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(vec![
                TimeSlot::parse("MON-1", Weekday::Mon, "09:00", "10:00").unwrap(),
                TimeSlot::parse("TUE-1", Weekday::Tue, "09:00", "10:00").unwrap(),
            ])
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(1).with_teacher("T1"))
            .with_subject(Subject::new("S2").for_batch("CSE", 3).with_hours(1).with_teacher("T2"));
        let store = InMemoryStore::new(catalog);
        let engine = fixed_engine();
        let constraints = constraints().with_lunch_break(false).with_clear_existing(false);

        let first = engine.run(&constraints, &store, &store);
        assert_eq!(first.state, RunState::Succeeded);
        assert_eq!(first.entries.len(), 2);

        let second = engine.run(&constraints, &store, &store);
        assert!(second.success);
        assert_eq!(second.state, RunState::Succeeded);
        assert!(second.entries.is_empty());
        assert_eq!(second.statistics.requirements_met, 2);
        assert_eq!(second.statistics.scheduled_slots, 2);

        let stored = store.entries_for(&constraints.batch).unwrap();
        assert_eq!(stored.len(), 2);
        assert_one_class_per_cell(&stored);
        for subject in ["S1", "S2"] {
            let count = stored
                .iter()
                .filter(|e| e.subject_id.as_deref() == Some(subject))
                .count();
            assert_eq!(count, 1, "{subject} stored {count} times");
        }
    }

    #[test]
    fn test_rerun_keeping_timetable_tops_up_missing_periods() {
        let catalog = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(2))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(3).with_teacher("T1"));
        let monday = catalog.time_slots[0].clone();
        let store = InMemoryStore::new(catalog)
            .with_timetable(BatchKey::new("CSE", 3), vec![ScheduledEntry::theory("S1", "T1", "R1", &monday)]);
        let constraints = constraints().with_lunch_break(false).with_clear_existing(false);

        let result = fixed_engine().run(&constraints, &store, &store);
        assert_eq!(result.state, RunState::Succeeded);
        assert_eq!(result.entries.len(), 2);
        assert!(result.entries.iter().all(|e| e.time_slot_id != monday.id));
        assert_eq!(result.statistics.theory_entries, 3);

        let stored = store.entries_for(&constraints.batch).unwrap();
        assert_eq!(stored.len(), 3);
        assert_one_class_per_cell(&stored);
    }

    #[test]
    fn test_concurrent_runs_share_engine_and_store() {
        let catalog = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_teacher(Teacher::new("T2"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(2))
            .with_subject(Subject::new("C1").for_batch("CSE", 3).with_hours(3).with_teacher("T1"))
            .with_subject(Subject::new("E1").for_batch("ECE", 3).with_hours(3).with_teacher("T2"));
        let store = InMemoryStore::new(catalog);
        let engine = TimetableEngine::new(EngineConfig::default().with_seed(11));
        let cse = GenerationConstraints::new(BatchKey::new("CSE", 3), "2026-27").with_lunch_break(false);
        let ece = GenerationConstraints::new(BatchKey::new("ECE", 3), "2026-27").with_lunch_break(false);

        let results = std::thread::scope(|scope| {
            let a = scope.spawn(|| engine.run(&cse, &store, &store));
            let b = scope.spawn(|| engine.run(&ece, &store, &store));
            [(a.join().unwrap(), &cse), (b.join().unwrap(), &ece)]
        });

        let mut all_stored = Vec::new();
        for (result, constraints) in &results {
            assert!(result.success);
            assert_eq!(teaching(result).len(), 3);
            // Both runs may pick R1 at the same time; only the sink can refuse one
            assert!(result
                .conflicts
                .iter()
                .all(|c| c.conflict_type == ConflictType::PersistenceConflict));

            let stored = store.entries_for(&constraints.batch).unwrap();
            assert_one_class_per_cell(&stored);
            let rejected = of_type(result, ConflictType::PersistenceConflict).len();
            assert_eq!(stored.len() + rejected, 3);
            all_stored.extend(stored);
        }

        let mut rooms = HashSet::new();
        let mut teachers = HashSet::new();
        for e in &all_stored {
            assert!(rooms.insert((e.classroom_id.clone(), e.day, e.time_slot_id.clone())));
            assert!(teachers.insert((e.teacher_id.clone(), e.day, e.time_slot_id.clone())));
        }
    }

    #[test]
    fn test_run_surfaces_persistence_conflicts() {
        struct StaleSource(TimetableInput);
        impl TimetableSource for StaleSource {
            fn load(&self, _: &GenerationConstraints) -> Result<TimetableInput> {
                Ok(self.0.clone())
            }
        }

        let catalog = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(1))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(1).with_teacher("T1"));
        let slot = catalog.time_slots[0].clone();
        let store = InMemoryStore::new(catalog.clone()).with_timetable(
            BatchKey::new("ECE", 3),
            vec![ScheduledEntry::theory("E1", "T9", "R1", &slot)],
        );

        // The source does not see the ECE booking, so the sink must catch it
        let result = fixed_engine().run(
            &constraints().with_lunch_break(false),
            &StaleSource(catalog),
            &store,
        );
        assert!(result.success);
        assert_eq!(result.state, RunState::SucceededWithConflicts);
        assert_eq!(of_type(&result, ConflictType::PersistenceConflict).len(), 1);
        assert!(!result.is_publishable());
        assert!(store.entries_for(&BatchKey::new("CSE", 3)).unwrap().is_empty());
    }

    #[test]
    fn test_failed_run_persists_nothing() {
        let store = InMemoryStore::new(TimetableInput::new());
        let result = fixed_engine().run(&constraints(), &store, &store);
        assert!(!result.success);
        assert!(store.batches().unwrap().is_empty());
    }

    #[test]
    fn test_result_wire_shape() {
        let input = TimetableInput::new()
            .with_teacher(Teacher::new("T1"))
            .with_classroom(Classroom::lecture("R1"))
            .with_time_slots(week_slots(1))
            .with_subject(Subject::new("S1").for_batch("CSE", 3).with_hours(1).with_teacher("T1"));
        let result = fixed_engine().generate(&constraints(), &input);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["state"], "SUCCEEDED");
        assert!(json["generatedAt"].is_string());
        assert_eq!(json["statistics"]["totalSlots"], 6);
    }
}
