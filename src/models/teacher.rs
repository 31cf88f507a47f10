//! Teacher (faculty) model.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A faculty member who can be assigned to periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Home department.
    pub department: String,
    /// Daily teaching cap in hours.
    pub max_hours_per_day: u32,
    /// Time slot IDs this teacher can never take.
    pub unavailable_slots: Vec<String>,
    /// Days the teacher would rather teach on. Tried first.
    pub preferred_days: Vec<Weekday>,
}

impl Teacher {
    /// Creates a teacher with a 6-hour daily cap.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department: String::new(),
            max_hours_per_day: 6,
            unavailable_slots: Vec::new(),
            preferred_days: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the daily hour cap.
    pub fn with_max_hours_per_day(mut self, hours: u32) -> Self {
        self.max_hours_per_day = hours;
        self
    }

    /// Marks a slot as unavailable.
    pub fn with_unavailable_slot(mut self, slot_id: impl Into<String>) -> Self {
        self.unavailable_slots.push(slot_id.into());
        self
    }

    /// Adds a preferred day.
    pub fn with_preferred_day(mut self, day: Weekday) -> Self {
        self.preferred_days.push(day);
        self
    }

    /// Whether the slot is on the teacher's unavailable list.
    pub fn is_slot_blocked(&self, slot_id: &str) -> bool {
        self.unavailable_slots.iter().any(|s| s == slot_id)
    }

    /// Daily cap in minutes, further limited by a run-wide cap.
    pub fn daily_cap_minutes(&self, run_cap_hours: u32) -> u32 {
        self.max_hours_per_day.min(run_cap_hours) * 60
    }
}
