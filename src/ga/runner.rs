//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization → evaluation → {selection → crossover → mutation →
//! evaluation}* → termination.
//!
//! # Termination
//!
//! A run stops when the problem reports a target fitness
//! ([`GaProblem::is_target`]), after `max_generations`, on cancellation,
//! or when the time limit elapses. Whatever the reason, the best
//! individual ever observed is returned.
//!
//! # Stagnation
//!
//! When the best-ever fitness has not improved for `stagnation_limit`
//! consecutive generations the population is rebuilt from scratch, keeping
//! the current elites in place. The run then continues.

use super::config::GaConfig;
use super::selection::tournament;
use super::types::{Fitness, GaProblem, Individual};
use crate::error::ConfigError;
use crate::random::rng_from;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Per-generation statistics passed to [`GaProblem::on_generation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    /// Best-ever fitness so far.
    pub best_fitness: f64,
    /// Best fitness in this generation's population.
    pub generation_best: f64,
    /// Mean fitness of this generation's population.
    pub mean_fitness: f64,
    /// Consecutive generations without improvement of the best-ever fitness.
    pub stagnant_generations: usize,
}

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found during the entire run.
    pub best: I,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: I::Fitness,

    /// Number of generations executed (excluding initialization).
    pub generations: usize,

    /// How many times the population was reseeded after stagnation.
    pub stagnation_resets: usize,

    /// Whether the run stopped because the target fitness was reached.
    pub target_reached: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the run hit its time limit.
    pub timed_out: bool,

    /// Best-ever fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let problem = MyProblem::new();
/// let config = GaConfig::default().with_seed(42);
/// let result = GaRunner::run(&problem, &config)?;
/// println!("Best fitness: {:?}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA optimization.
    pub fn run<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
    ) -> Result<GaResult<P::Individual>, ConfigError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// The flag is polled once per generation. When it is set the run
    /// stops and returns the best solution found so far.
    pub fn run_with_cancel<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult<P::Individual>, ConfigError> {
        config.validate()?;
        Ok(Self::evolve(problem, config, cancel))
    }

    /// The evolutionary loop proper. `config` must be valid.
    pub(crate) fn evolve<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> GaResult<P::Individual> {
        let started = Instant::now();
        let mut rng = rng_from(config.seed);

        // 1. Initialize and evaluate
        let mut population: Vec<P::Individual> = (0..config.population_size)
            .map(|_| problem.create_individual(&mut rng))
            .collect();
        evaluate_population(problem, &mut population, config.parallel);

        // 2. Track best
        let mut best = find_best(&population).clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness().to_f64());

        let mut stagnant = 0usize;
        let mut stagnation_resets = 0usize;
        let mut generations = 0usize;
        let mut target_reached = problem.is_target(best.fitness());
        let mut cancelled = false;
        let mut timed_out = false;

        tracing::debug!(
            population = config.population_size,
            initial_best = best.fitness().to_f64(),
            "initial population evaluated"
        );

        // 3. Evolutionary loop
        while !target_reached && generations < config.max_generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() >= limit as u128 {
                    timed_out = true;
                    break;
                }
            }

            sort_best_first(&mut population);

            // Stagnation: rebuild the population around the current elites
            if config.stagnation_limit > 0 && stagnant >= config.stagnation_limit {
                reseed(problem, &mut population, config, &mut rng);
                stagnant = 0;
                stagnation_resets += 1;
                tracing::debug!(
                    generation = generations,
                    resets = stagnation_resets,
                    "population reseeded after stagnation"
                );
            }

            // Elite preservation
            let elite_count = config.elite_count;
            let mut next_gen: Vec<P::Individual> = population[..elite_count].to_vec();

            // Generate offspring
            while next_gen.len() < config.population_size {
                let p1 = tournament(&population, config.tournament_size, &mut rng);
                let p2 = tournament(&population, config.tournament_size, &mut rng);

                let children = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    problem.crossover(&population[p1], &population[p2], &mut rng)
                } else {
                    vec![population[p1].clone(), population[p2].clone()]
                };

                for mut child in children {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    problem.mutate(&mut child, config.mutation_rate, &mut rng);
                    next_gen.push(child);
                }
            }

            // Evaluate new individuals (elites are already evaluated)
            evaluate_population(problem, &mut next_gen[elite_count..], config.parallel);
            population = next_gen;
            generations += 1;

            // Update best
            let gen_best = find_best(&population);
            let gen_best_fitness = gen_best.fitness();
            if gen_best_fitness > best.fitness() {
                best = gen_best.clone();
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            fitness_history.push(best.fitness().to_f64());

            let stats = GenerationStats {
                generation: generations,
                best_fitness: best.fitness().to_f64(),
                generation_best: gen_best_fitness.to_f64(),
                mean_fitness: mean_fitness(&population),
                stagnant_generations: stagnant,
            };
            tracing::trace!(
                generation = stats.generation,
                best = stats.best_fitness,
                generation_best = stats.generation_best,
                mean = stats.mean_fitness,
                "generation complete"
            );
            problem.on_generation(&stats);

            if problem.is_target(gen_best_fitness) {
                target_reached = true;
                tracing::debug!(generation = generations, "target fitness reached");
            }
        }

        GaResult {
            best_fitness: best.fitness(),
            best,
            generations,
            stagnation_resets,
            target_reached,
            cancelled,
            timed_out,
            fitness_history,
        }
    }
}

/// Replaces the population with fresh individuals, keeping the first
/// `elite_count` (the population must be sorted best-first).
fn reseed<P: GaProblem, R: Rng>(
    problem: &P,
    population: &mut Vec<P::Individual>,
    config: &GaConfig,
    rng: &mut R,
) {
    let elite_count = config.elite_count.min(population.len());
    population.truncate(elite_count);
    while population.len() < config.population_size {
        population.push(problem.create_individual(rng));
    }
    evaluate_population(problem, &mut population[elite_count..], config.parallel);
    sort_best_first(population);
}

/// Evaluate all individuals in the slice.
fn evaluate_population<P: GaProblem>(
    problem: &P,
    population: &mut [P::Individual],
    parallel: bool,
) {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            population.par_iter_mut().for_each(|ind| {
                let f = problem.evaluate(ind);
                ind.set_fitness(f);
            });
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for ind in population.iter_mut() {
        let f = problem.evaluate(ind);
        ind.set_fitness(f);
    }
}

/// Sort descending by fitness (best first).
fn sort_best_first<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(CmpOrdering::Equal)
    });
}

/// Find the individual with the best (highest) fitness.
///
/// Ties resolve to the earliest individual.
fn find_best<I: Individual>(population: &[I]) -> &I {
    let mut best = &population[0];
    for ind in &population[1..] {
        if ind.fitness() > best.fitness() {
            best = ind;
        }
    }
    best
}

fn mean_fitness<I: Individual>(population: &[I]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|i| i.fitness().to_f64()).sum::<f64>() / population.len() as f64
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::GaConfig;
    use std::sync::Mutex;

    // ---- OneMax problem: maximize the number of set bits ----

    #[derive(Clone, Debug)]
    struct BitString {
        bits: Vec<bool>,
        fitness: f64,
    }

    impl Individual for BitString {
        type Fitness = f64;
        fn fitness(&self) -> f64 {
            self.fitness
        }
        fn set_fitness(&mut self, f: f64) {
            self.fitness = f;
        }
    }

    struct OneMaxProblem {
        n: usize,
        target: Option<f64>,
        generations_seen: Mutex<Vec<usize>>,
    }

    impl OneMaxProblem {
        fn new(n: usize) -> Self {
            Self {
                n,
                target: None,
                generations_seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl GaProblem for OneMaxProblem {
        type Individual = BitString;

        fn create_individual<R: Rng>(&self, rng: &mut R) -> BitString {
            let bits: Vec<bool> = (0..self.n).map(|_| rng.random_bool(0.5)).collect();
            BitString {
                bits,
                fitness: f64::NEG_INFINITY,
            }
        }

        fn evaluate(&self, ind: &BitString) -> f64 {
            ind.bits.iter().filter(|&&b| b).count() as f64
        }

        fn crossover<R: Rng>(&self, p1: &BitString, p2: &BitString, rng: &mut R) -> Vec<BitString> {
            let point = rng.random_range(0..self.n);
            let mut c1 = p1.bits.clone();
            let mut c2 = p2.bits.clone();
            c1[point..].copy_from_slice(&p2.bits[point..]);
            c2[point..].copy_from_slice(&p1.bits[point..]);
            vec![
                BitString {
                    bits: c1,
                    fitness: f64::NEG_INFINITY,
                },
                BitString {
                    bits: c2,
                    fitness: f64::NEG_INFINITY,
                },
            ]
        }

        fn mutate<R: Rng>(&self, ind: &mut BitString, rate: f64, rng: &mut R) {
            for bit in ind.bits.iter_mut() {
                if rng.random_range(0.0..1.0) < rate {
                    *bit = !*bit;
                }
            }
        }

        fn is_target(&self, fitness: f64) -> bool {
            self.target.is_some_and(|t| fitness >= t)
        }

        fn on_generation(&self, stats: &GenerationStats) {
            if let Ok(mut seen) = self.generations_seen.lock() {
                seen.push(stats.generation);
            }
        }
    }

    fn sequential(pop: usize, gens: usize) -> GaConfig {
        GaConfig::default()
            .with_population_size(pop)
            .with_max_generations(gens)
            .with_mutation_rate(0.05)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_onemax_convergence() {
        let problem = OneMaxProblem::new(20);
        let result = GaRunner::run(&problem, &sequential(50, 200)).unwrap();
        assert!(
            result.best_fitness >= 17.0,
            "expected fitness >= 17 for 20-bit OneMax, got {}",
            result.best_fitness
        );
    }

    #[test]
    fn test_best_ever_is_monotone() {
        let problem = OneMaxProblem::new(30);
        let config = sequential(20, 60).with_stagnation_limit(3);
        let result = GaRunner::run(&problem, &config).unwrap();
        for window in result.fitness_history.windows(2) {
            assert!(
                window[1] >= window[0],
                "best-ever fitness regressed: {} < {}",
                window[1],
                window[0]
            );
        }
        assert_eq!(result.best_fitness, *result.fitness_history.last().unwrap());
    }

    #[test]
    fn test_target_stops_early() {
        let mut problem = OneMaxProblem::new(10);
        problem.target = Some(8.0);
        let result = GaRunner::run(&problem, &sequential(30, 500)).unwrap();
        assert!(result.target_reached);
        assert!(result.generations < 500);
        assert!(result.best_fitness >= 8.0);
    }

    #[test]
    fn test_stagnation_reseeds_and_continues() {
        // 3 bits converge immediately; every later generation is stagnant.
        let problem = OneMaxProblem::new(3);
        let config = sequential(20, 40).with_stagnation_limit(5);
        let result = GaRunner::run(&problem, &config).unwrap();
        assert_eq!(result.generations, 40);
        assert!(result.stagnation_resets >= 1);
        assert_eq!(result.best_fitness, 3.0);
    }

    #[test]
    fn test_reseed_keeps_elites() {
        let problem = OneMaxProblem::new(16);
        let config = sequential(12, 10).with_elite_count(3);
        let mut rng = crate::random::create_rng(7);

        // graded individuals: the first three are strictly the best
        let mut population: Vec<BitString> = (0..config.population_size)
            .map(|i| {
                let ones = 16usize.saturating_sub(i);
                let mut ind = BitString {
                    bits: (0..16).map(|b| b < ones).collect(),
                    fitness: f64::NEG_INFINITY,
                };
                ind.set_fitness(problem.evaluate(&ind));
                ind
            })
            .collect();
        sort_best_first(&mut population);
        let elites: Vec<Vec<bool>> = population[..3].iter().map(|i| i.bits.clone()).collect();

        reseed(&problem, &mut population, &config, &mut rng);

        assert_eq!(population.len(), config.population_size);
        for elite in &elites {
            assert!(
                population.iter().any(|ind| &ind.bits == elite),
                "elite {elite:?} lost by reseed"
            );
        }
        // fresh individuals are evaluated and the population is sorted
        assert!(population.iter().all(|ind| ind.fitness.is_finite()));
        for pair in population.windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
        assert_eq!(population[0].bits, elites[0]);
    }

    #[test]
    fn test_cancellation() {
        let problem = OneMaxProblem::new(20);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            GaRunner::run_with_cancel(&problem, &sequential(20, 1000), Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.fitness_history.len(), 1);
    }

    #[test]
    fn test_time_limit() {
        let problem = OneMaxProblem::new(200);
        let config = sequential(200, 1_000_000)
            .with_stagnation_limit(0)
            .with_time_limit_ms(20);
        let result = GaRunner::run(&problem, &config).unwrap();
        assert!(result.timed_out);
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_fitness_history_and_callback() {
        let problem = OneMaxProblem::new(64);
        let config = sequential(20, 30).with_stagnation_limit(0);
        let result = GaRunner::run(&problem, &config).unwrap();
        assert_eq!(result.generations, 30);
        assert_eq!(result.fitness_history.len(), 31);
        let seen = problem.generations_seen.lock().unwrap();
        assert_eq!(*seen, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let problem = OneMaxProblem::new(40);
        let a = GaRunner::run(&problem, &sequential(20, 25)).unwrap();
        let b = GaRunner::run(&problem, &sequential(20, 25)).unwrap();
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.best.bits, b.best.bits);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let problem = OneMaxProblem::new(4);
        let config = GaConfig::default().with_population_size(3).with_elite_count(3);
        assert!(GaRunner::run(&problem, &config).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        // Evaluation is pure, so parallelism must not change the trajectory.
        let problem = OneMaxProblem::new(32);
        let seq = GaRunner::run(&problem, &sequential(30, 40)).unwrap();
        let par = GaRunner::run(&problem, &sequential(30, 40).with_parallel(true)).unwrap();
        assert_eq!(seq.fitness_history, par.fitness_history);
    }
}
