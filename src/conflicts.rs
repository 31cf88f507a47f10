//! Independent conflict validation.
//!
//! Re-scans a finished entry set without consulting allocator bookkeeping,
//! so a bug in placement shows up as a reported conflict rather than as
//! silently corrupted output.
//!
//! # Checks
//!
//! | Conflict | Rule |
//! |----------|------|
//! | `TEACHER_CONFLICT` | A teacher holds more than one distinct activity in a (day, slot) |
//! | `CLASSROOM_CONFLICT` | A room holds more than one entry in a (day, slot) |
//! | `TEACHER_OVERLOAD` | A teacher's minutes on a day exceed the effective cap |
//! | `INSUFFICIENT_PERIODS` | A requirement has fewer periods than required |
//! | `LAB_SEQUENCE_BROKEN` | A lab entry has no adjacent partner |
//!
//! Output is sorted, so validating an unchanged entry set twice yields the
//! same list regardless of entry order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Weekday;
use tracing::debug;

use crate::models::{gap_minutes, Conflict, ScheduledEntry, Teacher, TimeSlot, Timetable};
use crate::scheduler::{EngineConfig, GenerationConstraints, Requirement, TimetableInput};

/// Re-derives conflicts from a final entry set.
pub struct ConflictValidator<'a> {
    teachers: HashMap<&'a str, &'a Teacher>,
    slots: HashMap<&'a str, &'a TimeSlot>,
    run_cap_hours: u32,
    gap_tolerance: u32,
}

impl<'a> ConflictValidator<'a> {
    /// Creates a validator over the run's input.
    pub fn new(input: &'a TimetableInput, constraints: &GenerationConstraints, config: &EngineConfig) -> Self {
        Self {
            teachers: input.teachers.iter().map(|t| (t.id.as_str(), t)).collect(),
            slots: input.time_slots.iter().map(|s| (s.id.as_str(), s)).collect(),
            run_cap_hours: constraints.max_teacher_hours_per_day,
            gap_tolerance: config.lab_gap_tolerance_minutes,
        }
    }

    /// Runs every check and returns the sorted conflict list.
    pub fn validate(&self, entries: &[ScheduledEntry], requirements: &[Requirement]) -> Vec<Conflict> {
        let timetable = Timetable {
            entries: entries.to_vec(),
            conflicts: Vec::new(),
        };

        let mut conflicts = Vec::new();
        conflicts.extend(self.teacher_conflicts(entries));
        conflicts.extend(self.classroom_conflicts(entries));
        conflicts.extend(self.overloads(&timetable));
        conflicts.extend(self.shortfalls(&timetable, requirements));
        conflicts.extend(self.broken_lab_sequences(entries));

        conflicts.sort_by(|a, b| {
            a.conflict_type
                .cmp(&b.conflict_type)
                .then_with(|| a.entity_ids.cmp(&b.entity_ids))
                .then_with(|| day_index(a.day).cmp(&day_index(b.day)))
                .then_with(|| a.time_slot_id.cmp(&b.time_slot_id))
                .then_with(|| a.description.cmp(&b.description))
        });
        debug!(count = conflicts.len(), "validation finished");
        conflicts
    }

    fn teacher_conflicts(&self, entries: &[ScheduledEntry]) -> Vec<Conflict> {
        let mut activities: BTreeMap<(&str, u32, &str), BTreeSet<&str>> = BTreeMap::new();
        for e in entries.iter().filter(|e| !e.is_amenity()) {
            let (Some(teacher), Some(activity)) = (e.teacher_id.as_deref(), e.activity_key()) else {
                continue;
            };
            activities
                .entry((teacher, e.day.num_days_from_monday(), e.time_slot_id.as_str()))
                .or_default()
                .insert(activity);
        }

        activities
            .into_iter()
            .filter(|(_, set)| set.len() > 1)
            .map(|((teacher, day, slot), set)| {
                let list: Vec<&str> = set.into_iter().collect();
                Conflict::teacher_conflict(teacher, &list, weekday(day), slot)
            })
            .collect()
    }

    fn classroom_conflicts(&self, entries: &[ScheduledEntry]) -> Vec<Conflict> {
        let mut counts: BTreeMap<(&str, u32, &str), usize> = BTreeMap::new();
        for e in entries {
            if let Some(room) = e.classroom_id.as_deref() {
                *counts
                    .entry((room, e.day.num_days_from_monday(), e.time_slot_id.as_str()))
                    .or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|((room, day, slot), n)| Conflict::classroom_conflict(room, n, weekday(day), slot))
            .collect()
    }

    fn overloads(&self, timetable: &Timetable) -> Vec<Conflict> {
        timetable
            .teacher_minutes()
            .into_iter()
            .filter_map(|((teacher, day), minutes)| {
                let cap = self.cap_minutes(&teacher);
                (minutes > cap).then(|| Conflict::teacher_overload(&teacher, day, minutes, cap))
            })
            .collect()
    }

    fn shortfalls(&self, timetable: &Timetable, requirements: &[Requirement]) -> Vec<Conflict> {
        requirements
            .iter()
            .filter_map(|req| {
                let scheduled = if req.is_lab {
                    timetable.lab_sessions(&req.subject_id)
                } else {
                    timetable.theory_periods(&req.subject_id)
                };
                (scheduled < req.periods_required).then(|| {
                    Conflict::insufficient_periods(&req.subject_id, req.is_lab, scheduled, req.periods_required)
                })
            })
            .collect()
    }

    fn broken_lab_sequences(&self, entries: &[ScheduledEntry]) -> Vec<Conflict> {
        let labs: Vec<&ScheduledEntry> = entries.iter().filter(|e| e.is_lab).collect();

        labs.iter()
            .filter(|lab| {
                !labs.iter().any(|other| {
                    !std::ptr::eq(**lab, *other)
                        && other.day == lab.day
                        && other.subject_id == lab.subject_id
                        && other.teacher_id == lab.teacher_id
                        && other.classroom_id == lab.classroom_id
                        && self.adjacent_either_way(&lab.time_slot_id, &other.time_slot_id)
                })
            })
            .map(|lab| {
                Conflict::lab_sequence_broken(
                    lab.subject_id.as_deref().unwrap_or_default(),
                    lab.day,
                    &lab.time_slot_id,
                )
            })
            .collect()
    }

    fn adjacent_either_way(&self, a: &str, b: &str) -> bool {
        let (Some(a), Some(b)) = (self.slots.get(a), self.slots.get(b)) else {
            return false;
        };
        let tolerance = i64::from(self.gap_tolerance);
        let forward = gap_minutes(a.end, b.start);
        let backward = gap_minutes(b.end, a.start);
        (0..=tolerance).contains(&forward) || (0..=tolerance).contains(&backward)
    }

    fn cap_minutes(&self, teacher_id: &str) -> u32 {
        self.teachers
            .get(teacher_id)
            .map_or(self.run_cap_hours * 60, |t| t.daily_cap_minutes(self.run_cap_hours))
    }
}

fn day_index(day: Option<Weekday>) -> Option<u32> {
    day.map(|d| d.num_days_from_monday())
}

fn weekday(index: u32) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictType, Severity};
    use crate::scheduler::BatchKey;

    fn input() -> TimetableInput {
        TimetableInput::new()
            .with_teacher(Teacher::new("T1").with_max_hours_per_day(2))
            .with_teacher(Teacher::new("T2"))
            .with_time_slots(vec![
                TimeSlot::parse("MON-1", Weekday::Mon, "09:00", "10:00").unwrap(),
                TimeSlot::parse("MON-2", Weekday::Mon, "10:00", "11:00").unwrap(),
                TimeSlot::parse("MON-3", Weekday::Mon, "11:30", "12:30").unwrap(),
                TimeSlot::parse("MON-4", Weekday::Mon, "12:30", "13:30").unwrap(),
            ])
    }

    fn constraints() -> GenerationConstraints {
        GenerationConstraints::new(BatchKey::new("CSE", 3), "2026-27")
    }

    fn slot<'a>(input: &'a TimetableInput, id: &str) -> &'a TimeSlot {
        input.time_slot(id).unwrap()
    }

    fn requirement(subject: &str, teacher: &str, periods: u32, is_lab: bool) -> Requirement {
        Requirement {
            subject_id: subject.into(),
            department: "CSE".into(),
            teacher_id: teacher.into(),
            periods_required: periods,
            periods_scheduled: 0,
            is_lab,
        }
    }

    #[test]
    fn test_clean_entries_have_no_conflicts() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let entries = vec![
            ScheduledEntry::lab("S1", "T2", "L1", slot(&input, "MON-1")),
            ScheduledEntry::lab("S1", "T2", "L1", slot(&input, "MON-2")),
            ScheduledEntry::theory("S2", "T1", "R1", slot(&input, "MON-3")),
        ];
        let reqs = vec![requirement("S1", "T2", 1, true), requirement("S2", "T1", 1, false)];
        assert!(validator.validate(&entries, &reqs).is_empty());
    }

    #[test]
    fn test_detects_double_bookings() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let entries = vec![
            ScheduledEntry::theory("S1", "T2", "R1", slot(&input, "MON-1")),
            ScheduledEntry::theory("S2", "T2", "R1", slot(&input, "MON-1")),
        ];
        let conflicts = validator.validate(&entries, &[]);

        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TeacherConflict);
        assert_eq!(conflicts[0].entity_ids, vec!["T2", "S1", "S2"]);
        assert_eq!(conflicts[1].conflict_type, ConflictType::ClassroomConflict);
        assert_eq!(conflicts[1].time_slot_id.as_deref(), Some("MON-1"));
    }

    #[test]
    fn test_same_activity_is_not_teacher_conflict() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let entries = vec![
            ScheduledEntry::theory("S1", "T2", "R1", slot(&input, "MON-1")),
            ScheduledEntry::theory("S1", "T2", "R2", slot(&input, "MON-1")),
        ];
        let conflicts = validator.validate(&entries, &[]);
        assert!(conflicts
            .iter()
            .all(|c| c.conflict_type != ConflictType::TeacherConflict));
    }

    #[test]
    fn test_overload_uses_effective_cap() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let entries: Vec<ScheduledEntry> = ["MON-1", "MON-2", "MON-3"]
            .iter()
            .map(|id| ScheduledEntry::theory("S1", "T1", "R1", slot(&input, id)))
            .collect();
        let conflicts = validator.validate(&entries, &[]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TeacherOverload);
        assert_eq!(conflicts[0].entity_ids, vec!["T1"]);
        assert_eq!(conflicts[0].day, Some(Weekday::Mon));
        assert!(conflicts[0].description.contains("180 min"));
    }

    #[test]
    fn test_shortfalls_per_kind() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let entries = vec![ScheduledEntry::theory("S1", "T2", "R1", slot(&input, "MON-1"))];
        let reqs = vec![requirement("S1", "T2", 1, true), requirement("S1", "T2", 3, false)];
        let conflicts = validator.validate(&entries, &reqs);

        assert_eq!(conflicts.len(), 2);
        assert!(conflicts
            .iter()
            .all(|c| c.conflict_type == ConflictType::InsufficientPeriods && c.severity == Severity::Warning));
        assert!(conflicts.iter().any(|c| c.description.contains("1 of 3")));
        assert!(conflicts.iter().any(|c| c.description.contains("0 of 1")));
    }

    #[test]
    fn test_lab_sequence_broken() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        // 30-minute gap between MON-2 and MON-3 exceeds the tolerance
        let entries = vec![
            ScheduledEntry::lab("S1", "T2", "L1", slot(&input, "MON-2")),
            ScheduledEntry::lab("S1", "T2", "L1", slot(&input, "MON-3")),
        ];
        let conflicts = validator.validate(&entries, &[]);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts
            .iter()
            .all(|c| c.conflict_type == ConflictType::LabSequenceBroken));
    }

    #[test]
    fn test_validation_is_order_independent() {
        let input = input();
        let config = EngineConfig::default();
        let constraints = constraints();
        let validator = ConflictValidator::new(&input, &constraints, &config);
        let mut entries = vec![
            ScheduledEntry::theory("S1", "T1", "R1", slot(&input, "MON-1")),
            ScheduledEntry::theory("S2", "T1", "R1", slot(&input, "MON-1")),
            ScheduledEntry::theory("S3", "T1", "R2", slot(&input, "MON-2")),
            ScheduledEntry::lab("S4", "T2", "L1", slot(&input, "MON-4")),
        ];
        let reqs = vec![requirement("S4", "T2", 2, true)];
        let first = validator.validate(&entries, &reqs);
        entries.reverse();
        let second = validator.validate(&entries, &reqs);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
