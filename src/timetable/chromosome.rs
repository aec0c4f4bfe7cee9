use std::cmp::Ordering;

use chrono::NaiveTime;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ga::{Fitness, Individual};
use crate::models::{SubjectId, Weekday};
use crate::shift::{period_wall_clock, Shift};

use super::Gene;

/// Evaluated quality of a chromosome.
///
/// Ordered by `value` (higher is better); ties prefer fewer conflicts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Score {
    /// Fitness, floored at 0.
    pub value: f64,
    /// Hard-constraint violations.
    pub conflicts: usize,
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.value.partial_cmp(&other.value)? {
            Ordering::Equal => Some(other.conflicts.cmp(&self.conflicts)),
            ord => Some(ord),
        }
    }
}

impl Fitness for Score {
    fn worst() -> Self {
        Score {
            value: f64::NEG_INFINITY,
            conflicts: usize::MAX,
        }
    }

    fn to_f64(self) -> f64 {
        self.value
    }
}

/// A complete candidate timetable.
///
/// `fitness` and `conflicts` are derived from `genes` by evaluation; a
/// freshly built chromosome carries [`Score::worst`] until it is
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chromosome {
    pub genes: Vec<Gene>,
    pub fitness: f64,
    pub conflicts: usize,
}

impl Individual for Chromosome {
    type Fitness = Score;

    fn fitness(&self) -> Score {
        Score {
            value: self.fitness,
            conflicts: self.conflicts,
        }
    }

    fn set_fitness(&mut self, score: Score) {
        self.fitness = score.value;
        self.conflicts = score.conflicts;
    }
}

/// A gene together with its wall-clock time, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledSession {
    pub gene: Gene,
    /// `None` when the gene's period lies outside the shift.
    pub wall_clock: Option<(NaiveTime, NaiveTime)>,
}

impl Chromosome {
    /// Creates an unevaluated chromosome.
    pub fn new(genes: Vec<Gene>) -> Self {
        let worst = Score::worst();
        Self {
            genes,
            fitness: worst.value,
            conflicts: worst.conflicts,
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Number of sessions scheduled for `subject_id`.
    pub fn sessions_of(&self, subject_id: SubjectId) -> usize {
        self.genes.iter().filter(|g| g.subject_id == subject_id).count()
    }

    /// Genes scheduled on `day`, in chromosome order.
    pub fn genes_on(&self, day: Weekday) -> impl Iterator<Item = &Gene> + '_ {
        self.genes.iter().filter(move |g| g.day == day)
    }

    /// Genes ordered by (day, period, subject).
    pub fn sorted_genes(&self) -> Vec<Gene> {
        let mut genes = self.genes.clone();
        genes.sort_by_key(|g| (g.day, g.period, g.subject_id));
        genes
    }

    /// Genes in (day, period) order with wall-clock times from `shift`.
    pub fn sessions(&self, shift: &Shift) -> Vec<ScheduledSession> {
        self.sorted_genes()
            .into_iter()
            .map(|gene| ScheduledSession {
                gene,
                wall_clock: period_wall_clock(shift, gene.period),
            })
            .collect()
    }
}
