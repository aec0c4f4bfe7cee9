//! Timetable fitness.
//!
//! Fitness starts at [`FitnessWeights::base`] and is reduced by weighted
//! penalty terms, then floored at zero:
//!
//! | term | counted as |
//! |------|------------|
//! | conflicts | Σ(group − 1) over shared (day, period), (teacher, day, period), (room, day, period) groups, plus genes hitting an existing entry's teacher, plus genes hitting an existing entry's room |
//! | same-day repeats | Σ(group − 1) over (subject, day) groups |
//! | teacher overload | sessions beyond the daily limit per (teacher, day) |
//! | free teacher days | (teacher, day) pairs with no session, see [`FreeDayScope`] (bonus) |
//! | daily variance | population variance of sessions per teaching day |
//! | session mismatch | Σ\|scheduled − required\| per subject |
//! | idle gaps | per day: late start (first period − 1) plus holes between sessions |
//!
//! Only the conflict term counts toward [`FitnessBreakdown::conflicts`].

use std::collections::{BTreeSet, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::models::{Subject, Weekday, DAYS_PER_WEEK};

use super::{Gene, Occupancy, Score};

/// Which (teacher, day) pairs the free-day bonus looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FreeDayScope {
    /// Only pairs that carry at least one session. No such pair is ever
    /// free, so the bonus stays 0 and fitness never exceeds `base`.
    #[default]
    ScheduledPairs,
    /// Every weekday for every teacher in the chromosome. Rewards packing
    /// a teacher's load into fewer days.
    WholeWeek,
}

/// Fitness weights.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessWeights {
    /// Starting score.
    pub base: f64,
    /// Penalty per hard conflict.
    pub conflict: f64,
    /// Penalty per extra same-subject session on one day.
    pub same_day_repeat: f64,
    /// Sessions a teacher may give per day before overload applies.
    pub teacher_daily_limit: usize,
    /// Penalty per session beyond `teacher_daily_limit`.
    pub teacher_overload: f64,
    /// Bonus per (teacher, day) pair without sessions.
    pub free_teacher_day: f64,
    /// Pairs considered for `free_teacher_day`.
    pub free_day_scope: FreeDayScope,
    /// Multiplier for the variance of sessions per day.
    pub daily_variance: f64,
    /// Penalty per missing or surplus session of a subject.
    pub session_mismatch: f64,
    /// Penalty per idle period.
    pub idle_gap: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            base: 100.0,
            conflict: 15.0,
            same_day_repeat: 3.0,
            teacher_daily_limit: 4,
            teacher_overload: 5.0,
            free_teacher_day: 2.0,
            free_day_scope: FreeDayScope::ScheduledPairs,
            daily_variance: 0.5,
            session_mismatch: 10.0,
            idle_gap: 25.0,
        }
    }
}

/// Raw counts behind a fitness value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessBreakdown {
    /// Excess genes sharing a (day, period).
    pub slot_conflicts: usize,
    /// Excess genes sharing a (teacher, day, period).
    pub teacher_conflicts: usize,
    /// Excess genes sharing a (classroom, day, period).
    pub classroom_conflicts: usize,
    /// Genes whose teacher is taken by an existing entry.
    pub existing_teacher_conflicts: usize,
    /// Genes whose classroom is taken by an existing entry.
    pub existing_classroom_conflicts: usize,
    pub same_day_repeats: usize,
    pub teacher_overload: usize,
    pub free_teacher_days: usize,
    pub daily_variance: f64,
    pub session_mismatch: usize,
    pub idle_gaps: usize,
}

impl FitnessBreakdown {
    /// Computes every term for `genes`. Only the daily limit and the
    /// free-day scope of `weights` affect the counts.
    pub fn compute(
        genes: &[Gene],
        subjects: &[Subject],
        occupancy: &Occupancy,
        weights: &FitnessWeights,
    ) -> Self {
        let mut slots: HashMap<(Weekday, u32), usize> = HashMap::new();
        let mut teacher_slots: HashMap<(u32, Weekday, u32), usize> = HashMap::new();
        let mut room_slots: HashMap<(u32, Weekday, u32), usize> = HashMap::new();
        let mut subject_days: HashMap<(u32, Weekday), usize> = HashMap::new();
        let mut teacher_days: HashMap<(u32, Weekday), usize> = HashMap::new();
        let mut subject_counts: HashMap<u32, usize> = HashMap::new();
        let mut day_periods: [Vec<u32>; DAYS_PER_WEEK] = Default::default();

        let mut b = FitnessBreakdown::default();

        for g in genes {
            *slots.entry((g.day, g.period)).or_insert(0) += 1;
            *teacher_slots.entry((g.teacher_id, g.day, g.period)).or_insert(0) += 1;
            *room_slots.entry((g.classroom_id, g.day, g.period)).or_insert(0) += 1;
            *subject_days.entry((g.subject_id, g.day)).or_insert(0) += 1;
            *teacher_days.entry((g.teacher_id, g.day)).or_insert(0) += 1;
            *subject_counts.entry(g.subject_id).or_insert(0) += 1;
            day_periods[g.day.index()].push(g.period);

            if occupancy.collides_on_teacher(g) {
                b.existing_teacher_conflicts += 1;
            }
            if occupancy.collides_on_classroom(g) {
                b.existing_classroom_conflicts += 1;
            }
        }

        b.slot_conflicts = excess(slots.values());
        b.teacher_conflicts = excess(teacher_slots.values());
        b.classroom_conflicts = excess(room_slots.values());
        b.same_day_repeats = excess(subject_days.values());

        b.teacher_overload = teacher_days
            .values()
            .map(|&n| n.saturating_sub(weights.teacher_daily_limit))
            .sum();

        b.free_teacher_days = match weights.free_day_scope {
            FreeDayScope::ScheduledPairs => teacher_days.values().filter(|&&n| n == 0).count(),
            FreeDayScope::WholeWeek => {
                let teachers: BTreeSet<u32> = genes.iter().map(|g| g.teacher_id).collect();
                teachers.len() * DAYS_PER_WEEK - teacher_days.len()
            }
        };

        // Variance over days that have at least one session.
        let loads: Vec<f64> = day_periods
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.len() as f64)
            .collect();
        if !loads.is_empty() {
            let mean = loads.iter().sum::<f64>() / loads.len() as f64;
            b.daily_variance =
                loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / loads.len() as f64;
        }

        b.session_mismatch = subjects
            .iter()
            .map(|s| {
                let scheduled = subject_counts.get(&s.id).copied().unwrap_or(0);
                scheduled.abs_diff(s.sessions_per_week as usize)
            })
            .sum();

        for periods in day_periods.iter_mut() {
            b.idle_gaps += idle_gaps(periods);
        }

        b
    }

    /// Sum of the hard-constraint terms.
    pub fn conflicts(&self) -> usize {
        self.slot_conflicts
            + self.teacher_conflicts
            + self.classroom_conflicts
            + self.existing_teacher_conflicts
            + self.existing_classroom_conflicts
    }

    /// Weighted fitness, floored at zero.
    pub fn fitness(&self, w: &FitnessWeights) -> f64 {
        let value = w.base - w.conflict * self.conflicts() as f64
            - w.same_day_repeat * self.same_day_repeats as f64
            - w.teacher_overload * self.teacher_overload as f64
            + w.free_teacher_day * self.free_teacher_days as f64
            - w.daily_variance * self.daily_variance
            - w.session_mismatch * self.session_mismatch as f64
            - w.idle_gap * self.idle_gaps as f64;
        value.max(0.0)
    }

    /// Fitness and conflict count together.
    pub fn score(&self, w: &FitnessWeights) -> Score {
        Score {
            value: self.fitness(w),
            conflicts: self.conflicts(),
        }
    }
}

/// Σ(count − 1) over groups.
fn excess<'a>(counts: impl Iterator<Item = &'a usize>) -> usize {
    counts.map(|&n| n.saturating_sub(1)).sum()
}

/// Idle periods on one day: a late start plus holes between sessions.
/// Sorts `periods` in place.
fn idle_gaps(periods: &mut [u32]) -> usize {
    if periods.is_empty() {
        return 0;
    }
    periods.sort_unstable();

    let mut gaps = periods[0].saturating_sub(1) as usize;
    for pair in periods.windows(2) {
        gaps += pair[1].saturating_sub(pair[0] + 1) as usize;
    }
    gaps
}
