use std::collections::HashSet;

use crate::models::{ClassroomId, ExistingEntry, ShiftId, TeacherId, Weekday};

use super::Gene;

/// Teacher and classroom slots taken by sessions committed elsewhere.
///
/// Built once per run from the existing entries of the run's shift and
/// only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    teachers: HashSet<(TeacherId, Weekday, u32)>,
    classrooms: HashSet<(ClassroomId, Weekday, u32)>,
}

impl Occupancy {
    /// Collects the entries belonging to `shift_id`; others are ignored.
    pub fn from_entries(entries: &[ExistingEntry], shift_id: ShiftId) -> Self {
        let mut occupancy = Self::default();
        for e in entries.iter().filter(|e| e.shift_id == shift_id) {
            occupancy.teachers.insert((e.teacher_id, e.day, e.period));
            occupancy.classrooms.insert((e.classroom_id, e.day, e.period));
        }
        occupancy
    }

    #[inline]
    pub fn teacher_taken(&self, teacher_id: TeacherId, day: Weekday, period: u32) -> bool {
        self.teachers.contains(&(teacher_id, day, period))
    }

    #[inline]
    pub fn classroom_taken(&self, classroom_id: ClassroomId, day: Weekday, period: u32) -> bool {
        self.classrooms.contains(&(classroom_id, day, period))
    }

    /// Whether `gene`'s teacher is taken at its slot.
    #[inline]
    pub fn collides_on_teacher(&self, gene: &Gene) -> bool {
        self.teacher_taken(gene.teacher_id, gene.day, gene.period)
    }

    /// Whether `gene`'s classroom is taken at its slot.
    #[inline]
    pub fn collides_on_classroom(&self, gene: &Gene) -> bool {
        self.classroom_taken(gene.classroom_id, gene.day, gene.period)
    }
}
