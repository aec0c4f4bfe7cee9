#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::models::{ClassroomId, ShiftId, SubjectId, TeacherId, Weekday};

/// One scheduling decision: a session of `subject_id` taught by
/// `teacher_id` in `classroom_id` at (`day`, `period`).
///
/// Genes are small `Copy` values. Operators never edit a gene that may be
/// shared with another chromosome; they build a new one with struct update
/// syntax instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gene {
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub classroom_id: ClassroomId,
    pub shift_id: ShiftId,
    pub day: Weekday,
    /// 1-based period number.
    pub period: u32,
}

impl Gene {
    /// Whether this gene occupies (`day`, `period`).
    #[inline]
    pub fn at(&self, day: Weekday, period: u32) -> bool {
        self.day == day && self.period == period
    }

    /// Same gene moved to another slot.
    #[inline]
    pub fn moved_to(self, day: Weekday, period: u32) -> Self {
        Self {
            day,
            period,
            ..self
        }
    }
}
