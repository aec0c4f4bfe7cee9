//! Weekly class timetable generation.
//!
//! Builds a Monday–Saturday timetable for one department/year cohort from
//! catalogs of subjects, teachers and classrooms inside a daily shift,
//! while avoiding slots already committed for other cohorts.
//!
//! - **Shift model** ([`shift`]): how many periods fit into a shift and when
//!   each one starts and ends.
//! - **Feasibility validation** ([`validation`]): a cheap static check that
//!   runs before the search and reports errors and warnings.
//! - **Genetic search** ([`ga`], [`timetable`]): a generic GA loop with
//!   elitism, tournament selection and stagnation reseeding, driven by the
//!   timetabling problem.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveTime;
//! use u_timetable::models::{Classroom, Subject, Teacher};
//! use u_timetable::shift::Shift;
//! use u_timetable::timetable::{generate, TimetableConfig, TimetableInput};
//! use u_timetable::validate;
//!
//! let subjects: Vec<Subject> = (1..=4)
//!     .map(|id| Subject::new(id, 1, 4).with_teacher(100 + id % 3))
//!     .collect();
//! let teachers: Vec<Teacher> = (100..103).map(|id| Teacher::new(id, 1)).collect();
//! let classrooms = vec![Classroom::new(1), Classroom::new(2), Classroom::new(3)];
//! let shift = Shift::new(
//!     1,
//!     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
//!     60,
//!     15,
//!     2,
//! );
//!
//! let report = validate(&subjects, &teachers, &classrooms, &shift);
//! assert!(report.ok, "{report}");
//!
//! let input = TimetableInput::new(&subjects, &teachers, &classrooms, &shift);
//! let outcome = generate(&input, &TimetableConfig::default().with_seed(1)).unwrap();
//! for session in outcome.chromosome.sessions(&shift) {
//!     let _ = (session.gene.day, session.wall_clock);
//! }
//! ```
//!
//! # Features
//!
//! - `parallel` (default): evaluate populations and batch runs with rayon
//! - `serde`: `Serialize`/`Deserialize` for catalog and result types

pub mod error;
pub mod ga;
pub mod models;
pub mod random;
pub mod shift;
pub mod timetable;
pub mod validation;

pub use error::{ConfigError, TimetableError};
pub use shift::{period_wall_clock, total_periods};
pub use timetable::{generate, run};
pub use validation::validate;
