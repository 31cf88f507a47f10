//! Input source and persistence sink.
//!
//! The engine reads one [`TimetableInput`] snapshot per run and hands the
//! finished entries to a sink. Storage is expected to enforce uniqueness on
//! (classroom, slot, day) and (teacher, slot, day); a clash is reported as a
//! `PERSISTENCE_CONFLICT` and the clashing row is not written.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Weekday;
use tracing::{debug, warn};

use crate::error::{Result, TimetableError};
use crate::models::{Conflict, ScheduledEntry};
use crate::scheduler::{BatchKey, GenerationConstraints, TimetableInput};

/// Supplies the read-only input for a run.
pub trait TimetableSource: Send + Sync {
    /// Loads the snapshot for the requested batch.
    ///
    /// `external_bookings` must hold other batches' entries. When the run
    /// keeps the batch's timetable, its stored entries go in
    /// `existing_entries`.
    fn load(&self, constraints: &GenerationConstraints) -> Result<TimetableInput>;
}

/// Stores generated entries.
pub trait TimetableSink: Send + Sync {
    /// Persists a batch's entries.
    ///
    /// # Returns
    /// - `Ok(conflicts)`: one `PERSISTENCE_CONFLICT` per rejected row
    /// - `Err`: storage failed; nothing was written
    fn persist(
        &self,
        batch: &BatchKey,
        entries: &[ScheduledEntry],
        clear_existing: bool,
    ) -> Result<Vec<Conflict>>;
}

type SlotKey = (String, String, Weekday);

/// In-process store holding a catalog and per-batch timetables.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: TimetableInput,
    timetables: RwLock<HashMap<BatchKey, Vec<ScheduledEntry>>>,
}

impl InMemoryStore {
    /// Creates a store over a catalog (teachers, subjects, rooms, slots...).
    ///
    /// Any `external_bookings` in the catalog are ignored; bookings are
    /// derived from stored timetables.
    pub fn new(catalog: TimetableInput) -> Self {
        Self {
            catalog,
            timetables: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds a stored timetable for a batch.
    pub fn with_timetable(mut self, batch: BatchKey, entries: Vec<ScheduledEntry>) -> Self {
        if let Ok(map) = self.timetables.get_mut() {
            map.insert(batch, entries);
        }
        self
    }

    /// Stored entries of a batch.
    pub fn entries_for(&self, batch: &BatchKey) -> Result<Vec<ScheduledEntry>> {
        let map = self.timetables.read().map_err(|_| poisoned())?;
        Ok(map.get(batch).cloned().unwrap_or_default())
    }

    /// Batches with a stored timetable.
    pub fn batches(&self) -> Result<Vec<BatchKey>> {
        let map = self.timetables.read().map_err(|_| poisoned())?;
        Ok(map.keys().cloned().collect())
    }
}

impl TimetableSource for InMemoryStore {
    fn load(&self, constraints: &GenerationConstraints) -> Result<TimetableInput> {
        let map = self.timetables.read().map_err(|_| poisoned())?;
        let external_bookings: Vec<ScheduledEntry> = map
            .iter()
            .filter(|(batch, _)| **batch != constraints.batch)
            .flat_map(|(_, entries)| entries.iter())
            .filter(|e| !e.is_amenity())
            .cloned()
            .collect();
        let existing_entries = match map.get(&constraints.batch) {
            Some(entries) if !constraints.clear_existing => entries.clone(),
            _ => Vec::new(),
        };

        debug!(
            batch = %constraints.batch,
            bookings = external_bookings.len(),
            kept = existing_entries.len(),
            "input loaded"
        );
        Ok(TimetableInput {
            external_bookings,
            existing_entries,
            ..self.catalog.clone()
        })
    }
}

impl TimetableSink for InMemoryStore {
    fn persist(
        &self,
        batch: &BatchKey,
        entries: &[ScheduledEntry],
        clear_existing: bool,
    ) -> Result<Vec<Conflict>> {
        let mut map = self.timetables.write().map_err(|_| poisoned())?;

        let mut room_keys: HashSet<SlotKey> = HashSet::new();
        let mut teacher_keys: HashSet<SlotKey> = HashSet::new();
        let mut batch_cells: HashSet<(String, Weekday)> = HashSet::new();
        for (owner, stored) in map.iter() {
            if owner == batch {
                if clear_existing {
                    continue;
                }
                batch_cells.extend(stored.iter().map(|e| (e.time_slot_id.clone(), e.day)));
            }
            for e in stored {
                register(&mut room_keys, &mut teacher_keys, e);
            }
        }

        let mut accepted = Vec::with_capacity(entries.len());
        let mut conflicts = Vec::new();
        for entry in entries {
            let cell = (entry.time_slot_id.clone(), entry.day);
            let verdict = if batch_cells.contains(&cell) {
                Some((batch.to_string(), "batch slot already filled"))
            } else {
                clash(&room_keys, &teacher_keys, entry)
            };
            match verdict {
                Some((entity, reason)) => {
                    warn!(
                        batch = %batch,
                        entity = %entity,
                        slot = %entry.time_slot_id,
                        "row rejected by uniqueness constraint"
                    );
                    conflicts.push(Conflict::persistence_conflict(
                        &entity,
                        entry.day,
                        &entry.time_slot_id,
                        reason,
                    ));
                }
                None => {
                    register(&mut room_keys, &mut teacher_keys, entry);
                    batch_cells.insert(cell);
                    accepted.push(entry.clone());
                }
            }
        }

        let stored = map.entry(batch.clone()).or_default();
        if clear_existing {
            stored.clear();
        }
        debug!(batch = %batch, written = accepted.len(), rejected = conflicts.len(), "timetable persisted");
        stored.extend(accepted);
        Ok(conflicts)
    }
}

fn register(rooms: &mut HashSet<SlotKey>, teachers: &mut HashSet<SlotKey>, e: &ScheduledEntry) {
    if let Some(room) = &e.classroom_id {
        rooms.insert((room.clone(), e.time_slot_id.clone(), e.day));
    }
    if let Some(teacher) = &e.teacher_id {
        teachers.insert((teacher.clone(), e.time_slot_id.clone(), e.day));
    }
}

fn clash(
    rooms: &HashSet<SlotKey>,
    teachers: &HashSet<SlotKey>,
    e: &ScheduledEntry,
) -> Option<(String, &'static str)> {
    if let Some(room) = &e.classroom_id {
        if rooms.contains(&(room.clone(), e.time_slot_id.clone(), e.day)) {
            return Some((room.clone(), "classroom already booked"));
        }
    }
    if let Some(teacher) = &e.teacher_id {
        if teachers.contains(&(teacher.clone(), e.time_slot_id.clone(), e.day)) {
            return Some((teacher.clone(), "teacher already booked"));
        }
    }
    None
}

fn poisoned() -> TimetableError {
    TimetableError::Persistence("timetable store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictType, Teacher, TimeSlot};

    fn slot(id: &str, start: &str, end: &str) -> TimeSlot {
        TimeSlot::parse(id, Weekday::Mon, start, end).unwrap()
    }

    fn cse() -> BatchKey {
        BatchKey::new("CSE", 3)
    }

    fn ece() -> BatchKey {
        BatchKey::new("ECE", 3)
    }

    #[test]
    fn test_load_collects_other_batches() {
        let s1 = slot("MON-1", "09:00", "10:00");
        let s2 = slot("MON-2", "10:00", "11:00");
        let store = InMemoryStore::new(TimetableInput::new().with_teacher(Teacher::new("T1")))
            .with_timetable(ece(), vec![
                ScheduledEntry::theory("E1", "T1", "R1", &s1),
                ScheduledEntry::amenity(&s2, true),
            ])
            .with_timetable(cse(), vec![ScheduledEntry::theory("C1", "T2", "R2", &s2)]);

        let clearing = GenerationConstraints::new(cse(), "2026-27");
        let input = store.load(&clearing).unwrap();
        assert_eq!(input.teachers.len(), 1);
        assert_eq!(input.external_bookings.len(), 1);
        assert_eq!(input.external_bookings[0].subject_id.as_deref(), Some("E1"));

        assert!(input.existing_entries.is_empty());

        let keeping = clearing.with_clear_existing(false);
        let input = store.load(&keeping).unwrap();
        assert_eq!(input.external_bookings.len(), 1);
        assert_eq!(input.existing_entries.len(), 1);
        assert_eq!(input.existing_entries[0].subject_id.as_deref(), Some("C1"));
    }

    #[test]
    fn test_persist_rejects_clashing_rows() {
        let s1 = slot("MON-1", "09:00", "10:00");
        let s2 = slot("MON-2", "10:00", "11:00");
        let store = InMemoryStore::default()
            .with_timetable(ece(), vec![ScheduledEntry::theory("E1", "T1", "R1", &s1)]);

        let conflicts = store
            .persist(
                &cse(),
                &[
                    ScheduledEntry::theory("C1", "T2", "R1", &s1), // room clash
                    ScheduledEntry::theory("C2", "T1", "R2", &s1), // teacher clash
                    ScheduledEntry::theory("C3", "T1", "R1", &s2),
                ],
                true,
            )
            .unwrap();

        assert_eq!(conflicts.len(), 2);
        assert!(conflicts
            .iter()
            .all(|c| c.conflict_type == ConflictType::PersistenceConflict));
        assert_eq!(conflicts[0].entity_ids, vec!["R1"]);
        assert_eq!(conflicts[1].entity_ids, vec!["T1"]);

        let stored = store.entries_for(&cse()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].subject_id.as_deref(), Some("C3"));
    }

    #[test]
    fn test_clear_existing_replaces_batch() {
        let s1 = slot("MON-1", "09:00", "10:00");
        let s2 = slot("MON-2", "10:00", "11:00");
        let store = InMemoryStore::default()
            .with_timetable(cse(), vec![ScheduledEntry::theory("OLD", "T1", "R1", &s1)]);

        // Same cell as the old row: accepted because the old row is cleared
        let conflicts = store
            .persist(&cse(), &[ScheduledEntry::theory("NEW", "T1", "R1", &s1)], true)
            .unwrap();
        assert!(conflicts.is_empty());
        let stored = store.entries_for(&cse()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].subject_id.as_deref(), Some("NEW"));

        // Without clearing, the kept row blocks the clash and new rows append
        let conflicts = store
            .persist(
                &cse(),
                &[
                    ScheduledEntry::theory("DUP", "T1", "R1", &s1),
                    ScheduledEntry::theory("MORE", "T1", "R1", &s2),
                ],
                false,
            )
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(store.entries_for(&cse()).unwrap().len(), 2);
        assert_eq!(store.batches().unwrap(), vec![cse()]);
    }

    #[test]
    fn test_kept_batch_cell_rejects_second_class() {
        let s1 = slot("MON-1", "09:00", "10:00");
        let store = InMemoryStore::default()
            .with_timetable(cse(), vec![ScheduledEntry::theory("C1", "T1", "R1", &s1)]);

        // Different teacher and room, same batch cell
        let conflicts = store
            .persist(&cse(), &[ScheduledEntry::theory("C2", "T2", "R2", &s1)], false)
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::PersistenceConflict);
        assert_eq!(conflicts[0].entity_ids, vec![cse().to_string()]);
        assert_eq!(store.entries_for(&cse()).unwrap().len(), 1);
    }

    #[test]
    fn test_amenities_never_clash() {
        let s1 = slot("MON-1", "09:00", "10:00");
        let store = InMemoryStore::default()
            .with_timetable(ece(), vec![ScheduledEntry::amenity(&s1, false)]);
        let conflicts = store
            .persist(&cse(), &[ScheduledEntry::amenity(&s1, true)], true)
            .unwrap();
        assert!(conflicts.is_empty());
    }
}
