//! Subject (course) model.

use serde::{Deserialize, Serialize};

/// A subject taught to a batch, with its weekly theory/lab load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Owning department.
    pub department: String,
    /// Semester the subject is taught in.
    pub semester: u32,
    /// Theory periods per week.
    pub hours_per_week: u32,
    /// Lab hours per week. Each lab session spans two slots.
    pub lab_hours_per_week: u32,
    /// Assigned teacher. `None` is a fatal input error.
    pub teacher_id: Option<String>,
}

impl Subject {
    /// Creates a subject with no load and no teacher.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            department: String::new(),
            semester: 1,
            hours_per_week: 0,
            lab_hours_per_week: 0,
            teacher_id: None,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the department and semester.
    pub fn for_batch(mut self, department: impl Into<String>, semester: u32) -> Self {
        self.department = department.into();
        self.semester = semester;
        self
    }

    /// Sets theory periods per week.
    pub fn with_hours(mut self, hours_per_week: u32) -> Self {
        self.hours_per_week = hours_per_week;
        self
    }

    /// Sets lab hours per week.
    pub fn with_lab_hours(mut self, lab_hours_per_week: u32) -> Self {
        self.lab_hours_per_week = lab_hours_per_week;
        self
    }

    /// Assigns the teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Whether the subject has any lab component.
    pub fn has_lab(&self) -> bool {
        self.lab_hours_per_week > 0
    }
}
