//! Weekly timetable search.
//!
//! A timetable is a [`Chromosome`]: a list of [`Gene`]s, each placing one
//! session of a subject at a (day, period) with a teacher and a classroom.
//! [`TimetableProblem`] plugs the representation into the generic
//! [`ga`](crate::ga) engine.
//!
//! # Entry points
//!
//! - [`generate`]: one search with explicit configuration
//! - [`generate_with_cancel`]: same, with a cancellation flag
//! - [`generate_many`]: several independent searches
//! - [`run`]: one search with default settings, returning the chromosome
//!
//! None of them fail on an infeasible catalog; run
//! [`validate`](crate::validation::validate) first. The only error is an
//! invalid [`GaConfig`].

mod chromosome;
mod fitness;
mod gene;
mod occupancy;
mod problem;

pub use chromosome::{Chromosome, ScheduledSession, Score};
pub use fitness::{FitnessBreakdown, FitnessWeights, FreeDayScope};
pub use gene::Gene;
pub use occupancy::Occupancy;
pub use problem::TimetableProblem;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::TimetableError;
use crate::ga::{GaConfig, GaResult, GaRunner};
use crate::models::{Classroom, ExistingEntry, Subject, Teacher};
use crate::random::derive_seed;
use crate::shift::Shift;

/// Catalogs for one search. Nothing here is modified by a run.
#[derive(Debug, Clone, Copy)]
pub struct TimetableInput<'a> {
    pub subjects: &'a [Subject],
    pub teachers: &'a [Teacher],
    pub classrooms: &'a [Classroom],
    pub shift: &'a Shift,
    /// Sessions already committed for other cohorts.
    pub existing: &'a [ExistingEntry],
}

impl<'a> TimetableInput<'a> {
    pub fn new(
        subjects: &'a [Subject],
        teachers: &'a [Teacher],
        classrooms: &'a [Classroom],
        shift: &'a Shift,
    ) -> Self {
        Self {
            subjects,
            teachers,
            classrooms,
            shift,
            existing: &[],
        }
    }

    /// Sets the committed sessions to avoid.
    pub fn with_existing(mut self, existing: &'a [ExistingEntry]) -> Self {
        self.existing = existing;
        self
    }

    fn problem(&self, config: &TimetableConfig) -> TimetableProblem<'a> {
        TimetableProblem::new(
            self.subjects,
            self.teachers,
            self.classrooms,
            self.shift,
            self.existing,
        )
        .with_weights(config.weights)
        .with_target_fitness(config.target_fitness)
    }
}

/// Settings for a timetable search.
///
/// # Examples
///
/// ```
/// use u_timetable::timetable::TimetableConfig;
///
/// let config = TimetableConfig::default()
///     .with_seed(42)
///     .with_target_fitness(90.0);
/// assert_eq!(config.ga.population_size, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TimetableConfig {
    pub ga: GaConfig,
    pub weights: FitnessWeights,
    /// A conflict-free timetable above this fitness stops the search.
    pub target_fitness: f64,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default(),
            weights: FitnessWeights::default(),
            target_fitness: 95.0,
        }
    }
}

impl TimetableConfig {
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = target;
        self
    }

    /// Shorthand for `ga.with_seed(seed)`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ga = self.ga.with_seed(seed);
        self
    }

    pub fn validate(&self) -> Result<(), TimetableError> {
        Ok(self.ga.validate()?)
    }
}

/// Result of one search.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Best timetable observed during the run.
    pub chromosome: Chromosome,
    /// Penalty terms of `chromosome`.
    pub breakdown: FitnessBreakdown,
    pub generations: usize,
    pub stagnation_resets: usize,
    pub target_reached: bool,
    pub cancelled: bool,
    pub timed_out: bool,
    /// Best-ever fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,
}

impl GenerationOutcome {
    fn from_result(problem: &TimetableProblem<'_>, result: GaResult<Chromosome>) -> Self {
        Self {
            breakdown: problem.breakdown(&result.best.genes),
            chromosome: result.best,
            generations: result.generations,
            stagnation_resets: result.stagnation_resets,
            target_reached: result.target_reached,
            cancelled: result.cancelled,
            timed_out: result.timed_out,
            fitness_history: result.fitness_history,
        }
    }

    /// Whether the timetable has no hard conflicts.
    pub fn is_conflict_free(&self) -> bool {
        self.chromosome.conflicts == 0
    }
}

/// Runs one search.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_timetable::models::{Classroom, Subject, Teacher};
/// use u_timetable::shift::Shift;
/// use u_timetable::timetable::{generate, TimetableConfig, TimetableInput};
///
/// let subjects: Vec<Subject> = (1..=4)
///     .map(|id| Subject::new(id, 1, 3).with_teacher(100 + id % 2))
///     .collect();
/// let teachers = vec![Teacher::new(100, 1), Teacher::new(101, 1)];
/// let classrooms = vec![Classroom::new(1), Classroom::new(2)];
/// let shift = Shift::new(
///     1,
///     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
///     60,
///     0,
///     4,
/// );
///
/// let input = TimetableInput::new(&subjects, &teachers, &classrooms, &shift);
/// let outcome = generate(&input, &TimetableConfig::default().with_seed(7)).unwrap();
/// assert!(outcome.chromosome.len() <= 12);
/// ```
pub fn generate(
    input: &TimetableInput<'_>,
    config: &TimetableConfig,
) -> Result<GenerationOutcome, TimetableError> {
    generate_with_cancel(input, config, None)
}

/// Runs one search that stops early once `cancel` is set.
///
/// The flag is polled once per generation; the best timetable found so far
/// is returned.
pub fn generate_with_cancel(
    input: &TimetableInput<'_>,
    config: &TimetableConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<GenerationOutcome, TimetableError> {
    config.validate()?;
    let problem = input.problem(config);

    tracing::info!(
        subjects = input.subjects.len(),
        teachers = input.teachers.len(),
        classrooms = input.classrooms.len(),
        periods = problem.periods(),
        existing = input.existing.len(),
        seed = ?config.ga.seed,
        "timetable search started"
    );

    let result = GaRunner::run_with_cancel(&problem, &config.ga, cancel)?;
    let outcome = GenerationOutcome::from_result(&problem, result);

    tracing::info!(
        fitness = outcome.chromosome.fitness,
        conflicts = outcome.chromosome.conflicts,
        genes = outcome.chromosome.len(),
        generations = outcome.generations,
        target_reached = outcome.target_reached,
        "timetable search finished"
    );
    Ok(outcome)
}

/// Runs `count` independent searches.
///
/// With a configured seed, run `i` uses a seed derived from it so the
/// whole batch is reproducible. Runs execute on the rayon pool when the
/// `parallel` feature is enabled and `config.ga.parallel` is set.
pub fn generate_many(
    input: &TimetableInput<'_>,
    config: &TimetableConfig,
    count: usize,
) -> Result<Vec<GenerationOutcome>, TimetableError> {
    config.validate()?;

    let configs: Vec<TimetableConfig> = (0..count)
        .map(|i| {
            let mut c = config.clone();
            if let Some(base) = config.ga.seed {
                c.ga.seed = Some(derive_seed(base, i as u64));
            }
            c
        })
        .collect();

    #[cfg(feature = "parallel")]
    {
        if config.ga.parallel {
            return configs.par_iter().map(|c| generate(input, c)).collect();
        }
    }

    configs.iter().map(|c| generate(input, c)).collect()
}

/// Runs one search with default settings and returns the best timetable.
///
/// Unseeded, so repeated calls generally differ.
pub fn run(
    subjects: &[Subject],
    teachers: &[Teacher],
    classrooms: &[Classroom],
    shift: &Shift,
    existing: &[ExistingEntry],
) -> Chromosome {
    let problem = TimetableProblem::new(subjects, teachers, classrooms, shift, existing);
    GaRunner::evolve(&problem, &GaConfig::default(), None).best
}
