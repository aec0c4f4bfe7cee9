#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Weekday;

pub type SubjectId = u32;
pub type TeacherId = u32;
pub type ClassroomId = u32;
pub type DepartmentId = u32;
pub type ShiftId = u32;

/// A subject taught to the cohort.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Subject {
    pub id: SubjectId,
    pub department_id: DepartmentId,
    /// Pre-assigned teacher. `None` means any free teacher of the
    /// department may be chosen during search.
    pub teacher_id: Option<TeacherId>,
    /// Required sessions per week.
    pub sessions_per_week: u32,
    /// Display name used in validation messages.
    pub name: Option<String>,
}

impl Subject {
    /// Creates a subject with no pre-assigned teacher.
    pub fn new(id: SubjectId, department_id: DepartmentId, sessions_per_week: u32) -> Self {
        Self {
            id,
            department_id,
            teacher_id: None,
            sessions_per_week,
            name: None,
        }
    }

    /// Pre-assigns a teacher.
    pub fn with_teacher(mut self, teacher_id: TeacherId) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("subject {}", self.id),
        }
    }
}

/// A teacher.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Teacher {
    pub id: TeacherId,
    /// Home department. Teachers without one are never auto-assigned.
    pub department_id: Option<DepartmentId>,
    /// Inactive teachers are ignored by validation and search.
    pub active: bool,
    pub name: Option<String>,
}

impl Teacher {
    /// Creates an active teacher belonging to `department_id`.
    pub fn new(id: TeacherId, department_id: DepartmentId) -> Self {
        Self {
            id,
            department_id: Some(department_id),
            active: true,
            name: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the teacher active or inactive.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whether this teacher is active and belongs to `department_id`.
    #[inline]
    pub fn serves(&self, department_id: DepartmentId) -> bool {
        self.active && self.department_id == Some(department_id)
    }
}

/// A classroom. Rooms have no department affinity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: Option<String>,
}

impl Classroom {
    pub fn new(id: ClassroomId) -> Self {
        Self { id, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A session already committed by another active timetable.
///
/// Existing entries are hard external constraints: the teacher and the
/// classroom they name are unavailable at their (day, period) for any
/// run on the same shift.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExistingEntry {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub classroom_id: ClassroomId,
    pub day: Weekday,
    /// 1-based period number.
    pub period: u32,
    pub shift_id: ShiftId,
}
