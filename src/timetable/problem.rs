//! Timetabling as a GA problem.
//!
//! Implements [`GaProblem`] for weekly timetables: random placement for
//! initialization, the weighted fitness of [`FitnessBreakdown`],
//! subject-block crossover, and four per-gene mutation operators.

use rand::prelude::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::ga::GaProblem;
use crate::models::{
    Classroom, ClassroomId, ExistingEntry, Subject, SubjectId, Teacher, TeacherId, Weekday,
};
use crate::shift::Shift;

use super::{Chromosome, FitnessBreakdown, FitnessWeights, Gene, Occupancy, Score};

/// Placement attempts per subject during initialization.
const SUBJECT_PLACEMENT_ATTEMPTS: usize = 100;
/// Random slots tried per placement attempt.
const SLOT_SAMPLES: usize = 50;
/// Random slots tried by the relocate mutation.
const RELOCATE_ATTEMPTS: usize = 20;

/// The timetabling problem for one department/year cohort.
///
/// Borrows the catalogs for the duration of a run and never modifies them.
///
/// # Example
/// ```ignore
/// use u_timetable::ga::{GaConfig, GaRunner};
/// use u_timetable::timetable::TimetableProblem;
///
/// let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &existing);
/// let result = GaRunner::run(&problem, &GaConfig::default().with_seed(1))?;
/// println!("fitness {} conflicts {}", result.best.fitness, result.best.conflicts);
/// ```
pub struct TimetableProblem<'a> {
    subjects: &'a [Subject],
    teachers: &'a [Teacher],
    classrooms: &'a [Classroom],
    shift: &'a Shift,
    periods: u32,
    occupancy: Occupancy,
    /// Distinct subject ids in catalog order.
    subject_order: Vec<SubjectId>,
    weights: FitnessWeights,
    target_fitness: f64,
}

impl<'a> TimetableProblem<'a> {
    /// Creates the problem. Existing entries of other shifts are ignored.
    pub fn new(
        subjects: &'a [Subject],
        teachers: &'a [Teacher],
        classrooms: &'a [Classroom],
        shift: &'a Shift,
        existing: &[ExistingEntry],
    ) -> Self {
        let mut seen = HashSet::new();
        let subject_order = subjects
            .iter()
            .map(|s| s.id)
            .filter(|id| seen.insert(*id))
            .collect();

        Self {
            subjects,
            teachers,
            classrooms,
            shift,
            periods: shift.periods_per_day(),
            occupancy: Occupancy::from_entries(existing, shift.id),
            subject_order,
            weights: FitnessWeights::default(),
            target_fitness: 95.0,
        }
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the fitness a conflict-free timetable must exceed to stop early.
    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = target;
        self
    }

    /// Periods per day used for slot sampling.
    pub fn periods(&self) -> u32 {
        self.periods
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Full fitness breakdown of `genes`.
    pub fn breakdown(&self, genes: &[Gene]) -> FitnessBreakdown {
        FitnessBreakdown::compute(genes, self.subjects, &self.occupancy, &self.weights)
    }

    // ---- availability ----

    fn random_slot<R: Rng>(&self, rng: &mut R) -> (Weekday, u32) {
        let day = Weekday::ALL[rng.random_range(0..Weekday::ALL.len())];
        let period = rng.random_range(1..=self.periods);
        (day, period)
    }

    /// Whether `teacher_id` is busy at the slot, in `genes` (except the
    /// gene at `skip`) or in existing entries.
    fn teacher_busy(
        &self,
        teacher_id: TeacherId,
        day: Weekday,
        period: u32,
        genes: &[Gene],
        skip: Option<usize>,
    ) -> bool {
        genes
            .iter()
            .enumerate()
            .any(|(i, g)| Some(i) != skip && g.teacher_id == teacher_id && g.at(day, period))
            || self.occupancy.teacher_taken(teacher_id, day, period)
    }

    fn classroom_busy(
        &self,
        classroom_id: ClassroomId,
        day: Weekday,
        period: u32,
        genes: &[Gene],
        skip: Option<usize>,
    ) -> bool {
        genes
            .iter()
            .enumerate()
            .any(|(i, g)| Some(i) != skip && g.classroom_id == classroom_id && g.at(day, period))
            || self.occupancy.classroom_taken(classroom_id, day, period)
    }

    /// Picks a teacher for `subject` at the slot.
    ///
    /// The pre-assigned teacher wins if active and free; otherwise a free
    /// active teacher of the subject's department is drawn uniformly.
    fn select_teacher<R: Rng>(
        &self,
        subject: &Subject,
        day: Weekday,
        period: u32,
        genes: &[Gene],
        skip: Option<usize>,
        rng: &mut R,
    ) -> Option<TeacherId> {
        if let Some(assigned) = subject.teacher_id {
            let known = self.teachers.iter().any(|t| t.id == assigned && t.active);
            if known && !self.teacher_busy(assigned, day, period, genes, skip) {
                return Some(assigned);
            }
        }

        let free: Vec<TeacherId> = self
            .teachers
            .iter()
            .filter(|t| t.serves(subject.department_id))
            .filter(|t| !self.teacher_busy(t.id, day, period, genes, skip))
            .map(|t| t.id)
            .collect();
        free.choose(rng).copied()
    }

    /// Draws a free classroom uniformly.
    fn select_classroom<R: Rng>(
        &self,
        day: Weekday,
        period: u32,
        genes: &[Gene],
        skip: Option<usize>,
        rng: &mut R,
    ) -> Option<ClassroomId> {
        let free: Vec<ClassroomId> = self
            .classrooms
            .iter()
            .filter(|c| !self.classroom_busy(c.id, day, period, genes, skip))
            .map(|c| c.id)
            .collect();
        free.choose(rng).copied()
    }

    // ---- initialization ----

    /// Tries to place one session of `subject` in a free slot.
    fn place_session<R: Rng>(&self, subject: &Subject, genes: &[Gene], rng: &mut R) -> Option<Gene> {
        if self.periods == 0 {
            return None;
        }
        for _ in 0..SLOT_SAMPLES {
            let (day, period) = self.random_slot(rng);
            if genes.iter().any(|g| g.at(day, period)) {
                continue;
            }
            let Some(teacher_id) = self.select_teacher(subject, day, period, genes, None, rng)
            else {
                continue;
            };
            let Some(classroom_id) = self.select_classroom(day, period, genes, None, rng) else {
                continue;
            };
            return Some(Gene {
                subject_id: subject.id,
                teacher_id,
                classroom_id,
                shift_id: self.shift.id,
                day,
                period,
            });
        }
        None
    }

    /// Builds one random timetable. Sessions that cannot be placed are
    /// left out.
    pub fn random_timetable<R: Rng>(&self, rng: &mut R) -> Chromosome {
        let mut genes = Vec::new();
        for subject in self.subjects {
            let required = subject.sessions_per_week as usize;
            let mut placed = 0;
            let mut attempts = 0;
            while placed < required && attempts < SUBJECT_PLACEMENT_ATTEMPTS {
                if let Some(gene) = self.place_session(subject, &genes, rng) {
                    genes.push(gene);
                    placed += 1;
                }
                attempts += 1;
            }
        }
        Chromosome::new(genes)
    }

    // ---- crossover ----

    /// Subject-block crossover.
    ///
    /// The subject list is split at a random point into S1 and S2. Child A
    /// takes parent 1's S1 genes and parent 2's S2 genes; child B takes
    /// the rest. With fewer than two subjects the parents are cloned.
    pub fn subject_crossover<R: Rng>(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let n = self.subject_order.len();
        if n < 2 {
            return (
                Chromosome::new(p1.genes.clone()),
                Chromosome::new(p2.genes.clone()),
            );
        }

        let split = rng.random_range(1..n);
        let first: HashSet<SubjectId> = self.subject_order[..split].iter().copied().collect();
        let second: HashSet<SubjectId> = self.subject_order[split..].iter().copied().collect();

        let mut a = Vec::with_capacity(p1.len());
        let mut b = Vec::with_capacity(p2.len());
        for g in &p1.genes {
            if first.contains(&g.subject_id) {
                a.push(*g);
            } else {
                b.push(*g);
            }
        }
        for g in &p2.genes {
            if second.contains(&g.subject_id) {
                a.push(*g);
            } else {
                b.push(*g);
            }
        }
        (Chromosome::new(a), Chromosome::new(b))
    }

    // ---- mutation ----

    /// Applies, to each gene with probability `rate`, one operator chosen
    /// uniformly from relocate, reassign teacher, reassign classroom and
    /// slot swap.
    pub fn mutate_genes<R: Rng>(&self, genes: &mut [Gene], rate: f64, rng: &mut R) {
        for i in 0..genes.len() {
            if rng.random_range(0.0..1.0) >= rate {
                continue;
            }
            match rng.random_range(0..4) {
                0 => self.relocate(genes, i, rng),
                1 => self.reassign_teacher(genes, i, rng),
                2 => self.reassign_classroom(genes, i, rng),
                _ => swap_slots(genes, rng),
            }
        }
    }

    /// Moves gene `i` to a random slot that is empty and where its teacher
    /// and classroom are free.
    fn relocate<R: Rng>(&self, genes: &mut [Gene], i: usize, rng: &mut R) {
        if self.periods == 0 {
            return;
        }
        let gene = genes[i];
        for _ in 0..RELOCATE_ATTEMPTS {
            let (day, period) = self.random_slot(rng);
            let occupied = genes
                .iter()
                .enumerate()
                .any(|(j, g)| j != i && g.at(day, period));
            if occupied
                || self.teacher_busy(gene.teacher_id, day, period, genes, Some(i))
                || self.classroom_busy(gene.classroom_id, day, period, genes, Some(i))
            {
                continue;
            }
            genes[i] = gene.moved_to(day, period);
            return;
        }
    }

    fn reassign_teacher<R: Rng>(&self, genes: &mut [Gene], i: usize, rng: &mut R) {
        let gene = genes[i];
        let Some(subject) = self.subjects.iter().find(|s| s.id == gene.subject_id) else {
            return;
        };
        if let Some(teacher_id) =
            self.select_teacher(subject, gene.day, gene.period, genes, Some(i), rng)
        {
            genes[i] = Gene { teacher_id, ..gene };
        }
    }

    fn reassign_classroom<R: Rng>(&self, genes: &mut [Gene], i: usize, rng: &mut R) {
        let gene = genes[i];
        if let Some(classroom_id) =
            self.select_classroom(gene.day, gene.period, genes, Some(i), rng)
        {
            genes[i] = Gene {
                classroom_id,
                ..gene
            };
        }
    }
}

/// Exchanges the (day, period) of two random genes.
fn swap_slots<R: Rng>(genes: &mut [Gene], rng: &mut R) {
    if genes.len() < 2 {
        return;
    }
    let a = rng.random_range(0..genes.len());
    let b = rng.random_range(0..genes.len());
    if a == b {
        return;
    }
    let (ga, gb) = (genes[a], genes[b]);
    genes[a] = ga.moved_to(gb.day, gb.period);
    genes[b] = gb.moved_to(ga.day, ga.period);
}

impl GaProblem for TimetableProblem<'_> {
    type Individual = Chromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> Chromosome {
        self.random_timetable(rng)
    }

    fn evaluate(&self, chromosome: &Chromosome) -> Score {
        self.breakdown(&chromosome.genes).score(&self.weights)
    }

    fn crossover<R: Rng>(&self, p1: &Chromosome, p2: &Chromosome, rng: &mut R) -> Vec<Chromosome> {
        let (a, b) = self.subject_crossover(p1, p2, rng);
        vec![a, b]
    }

    fn mutate<R: Rng>(&self, chromosome: &mut Chromosome, rate: f64, rng: &mut R) {
        self.mutate_genes(&mut chromosome.genes, rate, rng);
    }

    fn is_target(&self, score: Score) -> bool {
        score.conflicts == 0 && score.value > self.target_fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Individual;
    use crate::random::create_rng;
    use chrono::NaiveTime;

    fn shift() -> Shift {
        Shift::new(
            1,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            60,
            0,
            3,
        )
    }

    fn catalog() -> (Vec<Subject>, Vec<Teacher>, Vec<Classroom>) {
        let subjects = vec![
            Subject::new(1, 10, 5).with_teacher(100),
            Subject::new(2, 10, 5).with_teacher(101),
            Subject::new(3, 10, 5).with_teacher(102),
            Subject::new(4, 10, 5),
        ];
        let teachers = vec![
            Teacher::new(100, 10),
            Teacher::new(101, 10),
            Teacher::new(102, 10),
        ];
        let classrooms = (1..=3).map(Classroom::new).collect();
        (subjects, teachers, classrooms)
    }

    #[test]
    fn test_random_timetable_is_internally_consistent() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(3);

        for _ in 0..20 {
            let c = problem.random_timetable(&mut rng);
            // 20 sessions fit into 36 slots, so every session is placed.
            assert_eq!(c.len(), 20);
            let b = problem.breakdown(&c.genes);
            assert_eq!(b.conflicts(), 0);
            assert_eq!(b.session_mismatch, 0);
            for g in &c.genes {
                assert!((1..=6).contains(&g.period));
                assert_eq!(g.shift_id, 1);
            }
        }
    }

    #[test]
    fn test_preassigned_teacher_preferred() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(5);
        let c = problem.random_timetable(&mut rng);
        // Each slot holds one gene, so the pre-assigned teacher is never busy.
        for g in c.genes.iter().filter(|g| g.subject_id == 1) {
            assert_eq!(g.teacher_id, 100);
        }
    }

    #[test]
    fn test_unassigned_subject_uses_department_teacher() {
        let (subjects, mut teachers, classrooms) = catalog();
        teachers.push(Teacher::new(200, 99));
        teachers.push(Teacher::new(201, 10).with_active(false));
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(9);
        let c = problem.random_timetable(&mut rng);
        for g in c.genes.iter().filter(|g| g.subject_id == 4) {
            assert!([100, 101, 102].contains(&g.teacher_id));
        }
    }

    #[test]
    fn test_zero_periods_places_nothing() {
        let (subjects, teachers, classrooms) = catalog();
        let base = shift();
        let degenerate = Shift {
            end: base.start,
            total_periods: 0,
            ..base
        };
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &degenerate, &[]);
        let mut rng = create_rng(1);
        let mut c = problem.random_timetable(&mut rng);
        assert!(c.is_empty());
        let score = problem.evaluate(&c);
        c.set_fitness(score);
        assert_eq!(c.conflicts, 0);
        assert_eq!(c.fitness, 0.0); // 100 − 10 × 20 floored
    }

    #[test]
    fn test_initialization_avoids_existing_entries() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let existing: Vec<ExistingEntry> = Weekday::ALL
            .iter()
            .map(|&day| ExistingEntry {
                subject_id: 50,
                teacher_id: 100,
                classroom_id: 1,
                day,
                period: 1,
                shift_id: 1,
            })
            .collect();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &existing);
        let mut rng = create_rng(11);
        for _ in 0..10 {
            let c = problem.random_timetable(&mut rng);
            let b = problem.breakdown(&c.genes);
            assert_eq!(b.existing_teacher_conflicts, 0);
            assert_eq!(b.existing_classroom_conflicts, 0);
        }
    }

    #[test]
    fn test_crossover_keeps_subject_blocks() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(21);
        let p1 = problem.random_timetable(&mut rng);
        let p2 = problem.random_timetable(&mut rng);

        for _ in 0..20 {
            let (a, b) = problem.subject_crossover(&p1, &p2, &mut rng);
            assert_eq!(a.len() + b.len(), p1.len() + p2.len());
            for subject in &subjects {
                // every subject comes wholly from one parent in each child
                let from_p1: Vec<&Gene> =
                    p1.genes.iter().filter(|g| g.subject_id == subject.id).collect();
                let from_p2: Vec<&Gene> =
                    p2.genes.iter().filter(|g| g.subject_id == subject.id).collect();
                let in_a: Vec<&Gene> =
                    a.genes.iter().filter(|g| g.subject_id == subject.id).collect();
                assert!(in_a == from_p1 || in_a == from_p2);
            }
        }
    }

    #[test]
    fn test_crossover_single_subject_clones() {
        let subjects = vec![Subject::new(1, 10, 3).with_teacher(100)];
        let (_, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(2);
        let p1 = problem.random_timetable(&mut rng);
        let p2 = problem.random_timetable(&mut rng);
        let (a, b) = problem.subject_crossover(&p1, &p2, &mut rng);
        assert_eq!(a.genes, p1.genes);
        assert_eq!(b.genes, p2.genes);
    }

    #[test]
    fn test_mutation_preserves_subjects() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(8);
        let original = problem.random_timetable(&mut rng);

        let mut mutated = original.clone();
        problem.mutate_genes(&mut mutated.genes, 1.0, &mut rng);
        assert_eq!(mutated.len(), original.len());
        for subject in &subjects {
            assert_eq!(mutated.sessions_of(subject.id), original.sessions_of(subject.id));
        }
        for g in &mutated.genes {
            assert!((1..=problem.periods()).contains(&g.period));
        }
        assert_ne!(mutated.genes, original.genes);
    }

    #[test]
    fn test_zero_rate_mutation_is_identity() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        let mut rng = create_rng(8);
        let original = problem.random_timetable(&mut rng);
        let mut copy = original.clone();
        problem.mutate_genes(&mut copy.genes, 0.0, &mut rng);
        assert_eq!(copy.genes, original.genes);
    }

    #[test]
    fn test_swap_slots_exchanges_positions() {
        let g = |s, day, period| Gene {
            subject_id: s,
            teacher_id: 1,
            classroom_id: 1,
            shift_id: 1,
            day,
            period,
        };
        let mut genes = vec![g(1, Weekday::Monday, 1), g(2, Weekday::Friday, 4)];
        let mut rng = create_rng(0);
        // with two genes a swap happens whenever the two draws differ
        for _ in 0..10 {
            swap_slots(&mut genes, &mut rng);
        }
        let slots: HashSet<(Weekday, u32)> = genes.iter().map(|g| (g.day, g.period)).collect();
        assert!(slots.contains(&(Weekday::Monday, 1)));
        assert!(slots.contains(&(Weekday::Friday, 4)));
    }

    #[test]
    fn test_target() {
        let (subjects, teachers, classrooms) = catalog();
        let shift = shift();
        let problem = TimetableProblem::new(&subjects, &teachers, &classrooms, &shift, &[]);
        assert!(problem.is_target(Score {
            value: 95.5,
            conflicts: 0
        }));
        assert!(!problem.is_target(Score {
            value: 95.0,
            conflicts: 0
        }));
        assert!(!problem.is_target(Score {
            value: 99.0,
            conflicts: 1
        }));
    }
}
