//! Error types.
//!
//! Infeasible catalogs and poor search results are reported as data
//! (see [`ValidationReport`](crate::validation::ValidationReport) and
//! [`Chromosome::conflicts`](crate::timetable::Chromosome::conflicts)).
//! The types here cover the cases where a caller cannot proceed.

use thiserror::Error;

use crate::validation::ValidationIssue;

/// Invalid search-engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("population_size must be at least 2 (got {0})")]
    PopulationTooSmall(usize),

    #[error("max_generations must be at least 1")]
    ZeroGenerations,

    #[error("elite_count ({elite_count}) must be smaller than population_size ({population_size})")]
    TooManyElites {
        elite_count: usize,
        population_size: usize,
    },

    #[error("tournament_size must be at least 1")]
    ZeroTournamentSize,

    #[error("time_limit_ms must be positive or None")]
    ZeroTimeLimit,
}

/// Top-level error for timetable generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimetableError {
    #[error("invalid search configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("timetable generation not possible: {} feasibility error(s)", errors.len())]
    Infeasible { errors: Vec<ValidationIssue> },
}
