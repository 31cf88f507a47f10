//! Classroom model.

use serde::{Deserialize, Serialize};

/// A room periods can be held in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name (e.g., "B-204").
    pub name: String,
    /// Room classification.
    pub room_type: RoomType,
    /// Owning department.
    pub department: String,
    /// Seats.
    pub capacity: u32,
}

/// Room classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Regular lecture hall.
    Lecture,
    /// Laboratory. The only type lab sessions may use.
    Lab,
    /// Seminar room. Usable for theory.
    Seminar,
}

impl RoomType {
    /// Whether theory periods may be held in this room type.
    pub fn hosts_theory(self) -> bool {
        matches!(self, Self::Lecture | Self::Seminar)
    }
}

impl Classroom {
    /// Creates a room with zero capacity.
    pub fn new(id: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            room_type,
            department: String::new(),
            capacity: 0,
        }
    }

    /// Creates a lecture hall.
    pub fn lecture(id: impl Into<String>) -> Self {
        Self::new(id, RoomType::Lecture)
    }

    /// Creates a lab.
    pub fn lab(id: impl Into<String>) -> Self {
        Self::new(id, RoomType::Lab)
    }

    /// Creates a seminar room.
    pub fn seminar(id: impl Into<String>) -> Self {
        Self::new(id, RoomType::Seminar)
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

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Whether the room seats `strength` students.
    pub fn fits(&self, strength: Option<u32>) -> bool {
        strength.map_or(true, |s| self.capacity >= s)
    }
}
