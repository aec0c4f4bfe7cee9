//! Feasibility validation for timetable generation.
//!
//! A cheap, static check over catalog sizes and load constraints that runs
//! before the (expensive) genetic search. Every check always runs so the
//! caller receives the complete picture in one report.
//!
//! Errors are hard: if any is present the search must not run.
//! Warnings are informational and never block generation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TimetableError;
use crate::models::{Classroom, Subject, Teacher, TeacherId, DAYS_PER_WEEK};
use crate::shift::{total_periods, Shift};

/// Minimum number of subjects in one timetable.
pub const MIN_SUBJECTS: usize = 4;
/// Maximum number of subjects in one timetable.
pub const MAX_SUBJECTS: usize = 8;
/// Minimum shift length (minutes).
pub const MIN_SHIFT_MINUTES: i64 = 180;
/// Maximum shift length (minutes).
pub const MAX_SHIFT_MINUTES: i64 = 480;
/// A teacher may be pre-assigned to at most this many subjects.
pub const MAX_SUBJECTS_PER_TEACHER: usize = 2;
/// Minimum number of distinct pre-assigned teachers.
pub const MIN_ASSIGNED_TEACHERS: usize = 2;
/// Minimum number of classrooms.
pub const MIN_CLASSROOMS: usize = 2;
/// Minimum number of active teachers in the involved department(s).
pub const MIN_DEPARTMENT_TEACHERS: usize = 2;
/// Allowed range of sessions per week for one subject.
pub const SESSIONS_PER_WEEK_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationIssueKind {
    // ---- errors ----
    /// Fewer than [`MIN_SUBJECTS`] subjects.
    TooFewSubjects,
    /// More than [`MAX_SUBJECTS`] subjects.
    TooManySubjects,
    /// Shift window shorter than [`MIN_SHIFT_MINUTES`].
    ShiftTooShort,
    /// Shift window longer than [`MAX_SHIFT_MINUTES`].
    ShiftTooLong,
    /// Required sessions exceed the weekly slot count.
    InsufficientSlots,
    /// A teacher is pre-assigned to too many subjects.
    TeacherOverloaded,
    /// Fewer than [`MIN_ASSIGNED_TEACHERS`] distinct pre-assigned teachers.
    TooFewAssignedTeachers,
    /// Fewer than [`MIN_CLASSROOMS`] classrooms.
    TooFewClassrooms,
    /// A subject's sessions per week is outside [`SESSIONS_PER_WEEK_RANGE`].
    InvalidSessionCount,
    /// Not enough active teachers in the subjects' department(s).
    TooFewDepartmentTeachers,

    // ---- warnings ----
    /// Stored period count disagrees with the recomputed one.
    PeriodCountMismatch,
    /// Some subjects have no pre-assigned teacher.
    UnassignedTeachers,
    /// Fewer classrooms than subjects.
    FewerClassroomsThanSubjects,
    /// Subjects come from more than one department.
    MultipleDepartments,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationIssue {
    pub kind: ValidationIssueKind,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: ValidationIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationReport {
    /// `true` iff `errors` is empty.
    pub ok: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether any error of `kind` was reported.
    pub fn has_error(&self, kind: ValidationIssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Whether any warning of `kind` was reported.
    pub fn has_warning(&self, kind: ValidationIssueKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Converts the report into a `Result`, yielding the warnings on
    /// success.
    pub fn into_result(self) -> Result<Vec<ValidationIssue>, TimetableError> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(TimetableError::Infeasible {
                errors: self.errors,
            })
        }
    }

    fn error(&mut self, kind: ValidationIssueKind, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(kind, message));
    }

    fn warning(&mut self, kind: ValidationIssueKind, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(kind, message));
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok {
            write!(f, "Timetable generation is feasible.")?;
        } else {
            write!(f, "Timetable generation not possible:")?;
            for e in &self.errors {
                write!(f, "\n{e}")?;
            }
        }
        if !self.warnings.is_empty() {
            write!(f, "\n\nWarnings:")?;
            for w in &self.warnings {
                write!(f, "\n{w}")?;
            }
        }
        Ok(())
    }
}

/// Checks whether a timetable can reasonably be generated from the catalog.
///
/// Runs every check (never short-circuits):
///
/// 1. Subject count within [`MIN_SUBJECTS`]..=[`MAX_SUBJECTS`]
/// 2. Shift length within [`MIN_SHIFT_MINUTES`]..=[`MAX_SHIFT_MINUTES`]
/// 3. Stored period count matches the recomputed one (warning)
/// 4. Required sessions fit in `periods × 6` weekly slots
/// 5. No teacher pre-assigned to more than [`MAX_SUBJECTS_PER_TEACHER`] subjects;
///    unassigned subjects are reported as a warning
/// 6. At least [`MIN_ASSIGNED_TEACHERS`] distinct pre-assigned teachers
/// 7. At least [`MIN_CLASSROOMS`] classrooms; fewer rooms than subjects warns
/// 8. Subjects spanning several departments (warning)
/// 9. Each subject's sessions per week within [`SESSIONS_PER_WEEK_RANGE`]
/// 10. At least [`MIN_DEPARTMENT_TEACHERS`] active teachers in the involved departments
pub fn validate(
    subjects: &[Subject],
    teachers: &[Teacher],
    classrooms: &[Classroom],
    shift: &Shift,
) -> ValidationReport {
    use ValidationIssueKind::*;

    let mut report = ValidationReport::default();

    if subjects.len() < MIN_SUBJECTS {
        report.error(
            TooFewSubjects,
            format!("Minimum {MIN_SUBJECTS} subjects are required for timetable generation."),
        );
    }
    if subjects.len() > MAX_SUBJECTS {
        report.error(
            TooManySubjects,
            format!("Maximum {MAX_SUBJECTS} subjects allowed for timetable generation."),
        );
    }

    let shift_minutes = shift.duration_minutes();
    if shift_minutes < MIN_SHIFT_MINUTES {
        report.error(
            ShiftTooShort,
            format!(
                "Shift duration must be at least {} hours ({MIN_SHIFT_MINUTES} minutes); got {shift_minutes} minutes.",
                MIN_SHIFT_MINUTES / 60
            ),
        );
    }
    if shift_minutes > MAX_SHIFT_MINUTES {
        report.error(
            ShiftTooLong,
            format!(
                "Shift duration cannot exceed {} hours ({MAX_SHIFT_MINUTES} minutes); got {shift_minutes} minutes.",
                MAX_SHIFT_MINUTES / 60
            ),
        );
    }

    let recomputed = total_periods(shift);
    if recomputed != shift.total_periods {
        report.warning(
            PeriodCountMismatch,
            format!(
                "Shift total periods ({}) should be {recomputed} based on shift duration and break configuration.",
                shift.total_periods
            ),
        );
    }

    let sessions_needed: u64 = subjects.iter().map(|s| s.sessions_per_week as u64).sum();
    let slots_available = shift.total_periods as u64 * DAYS_PER_WEEK as u64;
    if sessions_needed > slots_available {
        report.error(
            InsufficientSlots,
            format!(
                "Not enough time slots available. Need {sessions_needed} slots but only {slots_available} available ({DAYS_PER_WEEK} days × {} periods).",
                shift.total_periods
            ),
        );
    }

    let mut subjects_per_teacher: BTreeMap<TeacherId, usize> = BTreeMap::new();
    for teacher_id in subjects.iter().filter_map(|s| s.teacher_id) {
        *subjects_per_teacher.entry(teacher_id).or_insert(0) += 1;
    }
    for (&teacher_id, &count) in &subjects_per_teacher {
        if count > MAX_SUBJECTS_PER_TEACHER {
            let name = teachers
                .iter()
                .find(|t| t.id == teacher_id)
                .and_then(|t| t.name.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            report.error(
                TeacherOverloaded,
                format!(
                    "Teacher '{name}' is assigned to {count} subjects. Maximum allowed is {MAX_SUBJECTS_PER_TEACHER} subjects per teacher."
                ),
            );
        }
    }

    let unassigned = subjects.iter().filter(|s| s.teacher_id.is_none()).count();
    if unassigned > 0 {
        report.warning(
            UnassignedTeachers,
            format!(
                "{unassigned} subject(s) don't have assigned teachers. Random department teachers will be assigned."
            ),
        );
    }

    if subjects_per_teacher.len() < MIN_ASSIGNED_TEACHERS {
        report.error(
            TooFewAssignedTeachers,
            format!("At least {MIN_ASSIGNED_TEACHERS} unique teachers must be assigned to subjects."),
        );
    }

    if classrooms.len() < MIN_CLASSROOMS {
        report.error(
            TooFewClassrooms,
            format!("At least {MIN_CLASSROOMS} classrooms are required for timetable generation."),
        );
    }
    if classrooms.len() < subjects.len() {
        report.warning(
            FewerClassroomsThanSubjects,
            format!(
                "Only {} classrooms available for {} subjects. This may cause scheduling conflicts.",
                classrooms.len(),
                subjects.len()
            ),
        );
    }

    let departments: BTreeSet<_> = subjects.iter().map(|s| s.department_id).collect();
    if departments.len() > 1 {
        report.warning(
            MultipleDepartments,
            "Subjects from multiple departments detected. Ensure teachers are from the correct departments.",
        );
    }

    for subject in subjects {
        if !SESSIONS_PER_WEEK_RANGE.contains(&subject.sessions_per_week) {
            report.error(
                InvalidSessionCount,
                format!(
                    "Subject '{}' has invalid sessions per week ({}). Must be between {} and {}.",
                    subject.label(),
                    subject.sessions_per_week,
                    SESSIONS_PER_WEEK_RANGE.start(),
                    SESSIONS_PER_WEEK_RANGE.end()
                ),
            );
        }
    }

    let department_teachers = teachers
        .iter()
        .filter(|t| departments.iter().any(|&d| t.serves(d)))
        .count();
    if department_teachers < MIN_DEPARTMENT_TEACHERS {
        report.error(
            TooFewDepartmentTeachers,
            format!(
                "Not enough teachers in the department. Found {department_teachers}, need at least {MIN_DEPARTMENT_TEACHERS}."
            ),
        );
    }

    report.ok = report.errors.is_empty();

    if report.ok {
        tracing::debug!(
            subjects = subjects.len(),
            warnings = report.warnings.len(),
            "timetable catalog is feasible"
        );
    } else {
        tracing::warn!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "timetable catalog failed feasibility validation"
        );
    }

    report
}
