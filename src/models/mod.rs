//! Catalog types consumed by the validator and the search engine.
//!
//! All types are plain data. The caller loads them (already filtered to a
//! single college, department and year) and hands them to the core by
//! reference; nothing in this crate mutates them.
//!
//! # Submodules
//!
//! - [`Weekday`]: the six teaching days
//! - [`Subject`], [`Teacher`], [`Classroom`]: the catalog
//! - [`ExistingEntry`]: sessions already committed by other timetables

mod catalog;
mod weekday;

pub use catalog::{
    Classroom, ClassroomId, DepartmentId, ExistingEntry, ShiftId, Subject, SubjectId, Teacher,
    TeacherId,
};
pub use weekday::Weekday;

/// Number of teaching days per week.
pub const DAYS_PER_WEEK: usize = 6;
