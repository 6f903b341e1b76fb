//! GA evolutionary loop execution.
//!
//! [`EvolutionEngine`] is a pull-driven state machine:
//! initialization → evaluation → termination check → reproduction → evaluation.
//! [`GaRunner`] drives an engine to completion, reports every generation to a
//! [`GenerationObserver`] and assembles the [`KnapsackResult`].

use super::config::{KnapsackConfig, Strategy, SurvivorPolicy, Termination};
use super::diversity::{diversity_rate, Convergence, DiversityMonitor};
use super::fitness::{
    average_fitness, evaluate_population, find_best, solution, sort_by_fitness_desc,
};
use super::operators::{generate_population, mutate, uniform_crossover};
use super::selection::select;
use super::types::{Chromosome, FittestRecord, GenerationResult, Individual, Solution};
use crate::error::{GaError, Result};
use crate::random::rng_from_seed;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Fittest tracking
// ============================================================================

/// Best-ever solution across all generations.
///
/// Neither strategy guarantees that a generation's best never gets worse, so
/// the incumbent is kept separately and only replaced by a strictly fitter
/// individual.
#[derive(Debug, Clone, Default)]
pub struct FittestTracker {
    record: Option<FittestRecord>,
}

impl FittestTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers the best individual of `population`.
    ///
    /// Returns `true` if the incumbent was replaced.
    pub fn update(&mut self, population: &[Individual], generation: usize) -> bool {
        let Some(best) = find_best(population) else {
            return false;
        };
        let improved = self
            .record
            .as_ref()
            .map_or(true, |r| best.fitness > r.fitness);
        if improved {
            self.record = Some(FittestRecord {
                chromosome: best.chromosome.clone(),
                fitness: best.fitness,
                generation,
            });
        }
        improved
    }

    /// Current incumbent, if any generation was offered yet.
    pub fn record(&self) -> Option<&FittestRecord> {
        self.record.as_ref()
    }
}

// ============================================================================
// Reproduction strategies
// ============================================================================

/// Elitist reproduction.
///
/// 1. Roulette-sample `population_size` candidates and rank them
/// 2. Copy the top `elitism_size` unchanged
/// 3. Breed the rest from the next `mating_pool_size` ranked candidates,
///    keeping the fitter of each pair of mutated children
pub fn reproduce_elitist<R: Rng>(
    population: &[Individual],
    config: &KnapsackConfig,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    let n = config.population_size;
    let mut candidates = select(population, n, rng)?;
    sort_by_fitness_desc(&mut candidates);

    let elite_count = config.elitism_size().min(n);
    let remaining = n - elite_count;
    let mut next_gen: Vec<Individual> = candidates[..elite_count].to_vec();
    if remaining == 0 {
        return Ok(next_gen);
    }

    let pool_size = config.mating_pool_size();
    if pool_size == 0 {
        return Err(GaError::EmptyMatingPool {
            pool: "mating",
            population_size: n,
        });
    }
    let mating_pool = &candidates[elite_count..elite_count + pool_size];

    // Breed all pairs first so the RNG stream does not depend on evaluation order.
    let mut children = Vec::with_capacity(remaining * 2);
    for _ in 0..remaining {
        let p1 = &mating_pool[rng.random_range(0..pool_size)];
        let p2 = &mating_pool[rng.random_range(0..pool_size)];
        let (c1, c2) = uniform_crossover(&p1.chromosome, &p2.chromosome, rng)?;
        children.push(mutate(&c1, config, rng));
        children.push(mutate(&c2, config, rng));
    }

    let evaluated = evaluate_population(children, config);
    next_gen.extend(
        evaluated
            .chunks_exact(2)
            .map(|pair| fitter_child(&pair[0], &pair[1]).clone()),
    );

    Ok(next_gen)
}

/// Returns the fitter of two siblings; ties go to the second.
pub fn fitter_child<'a>(first: &'a Individual, second: &'a Individual) -> &'a Individual {
    if first.fitness > second.fitness {
        first
    } else {
        second
    }
}

/// Mutates the leading `mutation_population_rate` share of `children` and
/// keeps the rest unchanged, preserving order.
///
/// Eligibility is positional, not per individual.
pub fn mutate_leading<R: Rng>(
    children: &[Chromosome],
    config: &KnapsackConfig,
    rng: &mut R,
) -> Vec<Chromosome> {
    let split = (children.len() as f64 * config.mutation_population_rate) as usize;
    let mut out: Vec<Chromosome> = children[..split]
        .iter()
        .map(|c| mutate(c, config, rng))
        .collect();
    out.extend_from_slice(&children[split..]);
    out
}

/// Non-elitist generational reproduction.
///
/// 1. Roulette-select a parent pool of `parent_pool_size`
/// 2. Breed exactly `population_size` children from random parent pairs
/// 3. Mutate the leading `mutation_population_rate` share of the children
/// 4. Rank parents and children together and pick survivors per
///    [`SurvivorPolicy`]
pub fn reproduce_non_elitist<R: Rng>(
    population: &[Individual],
    config: &KnapsackConfig,
    rng: &mut R,
) -> Result<Vec<Individual>> {
    let n = config.population_size;
    let parent_count = config.parent_pool_size();
    if parent_count == 0 {
        return Err(GaError::EmptyMatingPool {
            pool: "parent",
            population_size: n,
        });
    }
    let parents = select(population, parent_count, rng)?;

    let mut children: Vec<Chromosome> = Vec::with_capacity(n + 1);
    while children.len() < n {
        let p1 = &parents[rng.random_range(0..parent_count)];
        let p2 = &parents[rng.random_range(0..parent_count)];
        let (c1, c2) = uniform_crossover(&p1.chromosome, &p2.chromosome, rng)?;
        children.push(c1);
        children.push(c2);
    }
    children.truncate(n);

    let offspring = mutate_leading(&children, config, rng);

    let mut combined = population.to_vec();
    combined.extend(evaluate_population(offspring, config));
    sort_by_fitness_desc(&mut combined);

    match config.survivor_policy {
        SurvivorPolicy::FitnessProportionate => select(&combined, n, rng),
        SurvivorPolicy::Truncate => {
            combined.truncate(n);
            Ok(combined)
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// The generation budget was used up.
    GenerationLimit,
    /// Diversity fell to the convergence threshold.
    Converged,
    /// Diversity stayed flat for the configured number of generations.
    Plateau,
    /// Stopped through the cancellation flag.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Evaluated,
    Terminated(TerminationReason),
}

/// Pull-driven GA engine.
///
/// Each call to [`advance`](Self::advance) evaluates one generation (breeding
/// it first unless it is the initial one) and returns its statistics. Once a
/// termination condition holds, `advance` returns `Ok(None)`.
///
/// ```
/// use knapsack_ga::ga::{EvolutionEngine, Item, KnapsackConfig};
///
/// let config = KnapsackConfig::new(vec![Item::new(2.0, 3.0), Item::new(3.0, 4.0)], 5.0)
///     .with_population_size(8)
///     .with_generations(10)
///     .with_seed(1);
/// let mut engine = EvolutionEngine::new(config).unwrap();
/// let mut seen = 0;
/// while let Some(stats) = engine.advance().unwrap() {
///     assert_eq!(stats.generation, seen);
///     seen += 1;
/// }
/// assert_eq!(seen, 10);
/// ```
#[derive(Debug)]
pub struct EvolutionEngine<R: Rng = StdRng> {
    config: KnapsackConfig,
    rng: R,
    population: Vec<Individual>,
    generation: usize,
    phase: Phase,
    fittest: FittestTracker,
    monitor: DiversityMonitor,
}

impl EvolutionEngine<StdRng> {
    /// Creates an engine seeded from `config.seed`.
    pub fn new(config: KnapsackConfig) -> Result<Self> {
        let rng = rng_from_seed(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> EvolutionEngine<R> {
    /// Creates an engine drawing all randomness from `rng`.
    ///
    /// # Errors
    /// Any error from [`KnapsackConfig::validate`].
    pub fn with_rng(config: KnapsackConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let plateau = match config.termination {
            Termination::Convergence { plateau, .. } => plateau,
            Termination::Generations(_) => None,
        };
        let monitor = DiversityMonitor::new(config.diversity_threshold(), plateau);
        Ok(Self {
            config,
            rng,
            population: Vec::new(),
            generation: 0,
            phase: Phase::Init,
            fittest: FittestTracker::new(),
            monitor,
        })
    }

    /// Produces and evaluates the next generation.
    ///
    /// Returns `Ok(None)` once the run has terminated. On error the last
    /// evaluated generation stays in place.
    pub fn advance(&mut self) -> Result<Option<GenerationResult>> {
        match self.phase {
            Phase::Terminated(_) => return Ok(None),
            Phase::Init => {
                let chromosomes = generate_population(&self.config, &mut self.rng);
                self.population = evaluate_population(chromosomes, &self.config);
            }
            Phase::Evaluated => {
                let next = match self.config.strategy {
                    Strategy::Elitist => {
                        reproduce_elitist(&self.population, &self.config, &mut self.rng)?
                    }
                    Strategy::NonElitist => {
                        reproduce_non_elitist(&self.population, &self.config, &mut self.rng)?
                    }
                };
                self.population = next;
                self.generation += 1;
            }
        }
        Ok(Some(self.evaluate()))
    }

    fn evaluate(&mut self) -> GenerationResult {
        sort_by_fitness_desc(&mut self.population);
        if self.fittest.update(&self.population, self.generation) {
            debug!(
                generation = self.generation,
                fitness = self.population[0].fitness,
                "new fittest"
            );
        }

        let result = GenerationResult {
            generation: self.generation,
            average_fitness: average_fitness(&self.population),
            diversity_rate: diversity_rate(&self.population),
            best_fitness: self.population.first().map_or(0.0, |ind| ind.fitness),
        };
        debug!(
            generation = result.generation,
            average_fitness = result.average_fitness,
            diversity_rate = result.diversity_rate,
            best_fitness = result.best_fitness,
            "generation evaluated"
        );

        self.phase = match self.check_termination(result.diversity_rate) {
            Some(reason) => {
                info!(
                    generation = self.generation,
                    ?reason,
                    best_fitness = self.fittest.record().map(|r| r.fitness),
                    "evolution finished"
                );
                Phase::Terminated(reason)
            }
            None => Phase::Evaluated,
        };
        result
    }

    fn check_termination(&mut self, rate: f64) -> Option<TerminationReason> {
        let executed = self.generation + 1;
        match self.config.termination {
            Termination::Generations(n) => {
                (executed >= n).then_some(TerminationReason::GenerationLimit)
            }
            Termination::Convergence {
                max_generations, ..
            } => match self.monitor.observe(rate) {
                Some(Convergence::Collapsed) => Some(TerminationReason::Converged),
                Some(Convergence::Plateau) => Some(TerminationReason::Plateau),
                None => max_generations
                    .filter(|&m| executed >= m)
                    .map(|_| TerminationReason::GenerationLimit),
            },
        }
    }

    /// Stops the run; later calls to [`advance`](Self::advance) return `None`.
    pub fn cancel(&mut self) {
        if !self.is_terminated() {
            warn!(generation = self.generation, "evolution cancelled");
            self.phase = Phase::Terminated(TerminationReason::Cancelled);
        }
    }

    /// Whether a termination condition has been reached.
    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated(_))
    }

    /// Reason the run stopped, if it has.
    pub fn termination(&self) -> Option<TerminationReason> {
        match self.phase {
            Phase::Terminated(reason) => Some(reason),
            _ => None,
        }
    }

    /// Current population, ranked best first after evaluation.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Index of the most recently evaluated generation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best-ever solution so far.
    pub fn fittest(&self) -> Option<&FittestRecord> {
        self.fittest.record()
    }

    /// The configuration driving this engine.
    pub fn config(&self) -> &KnapsackConfig {
        &self.config
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Receives one record per evaluated generation.
///
/// `ranked` is the full population, best first. Implemented for any
/// `FnMut(&GenerationResult, &[Individual])` closure.
pub trait GenerationObserver {
    /// Called after each generation has been evaluated.
    fn on_generation(&mut self, result: &GenerationResult, ranked: &[Individual]);
}

impl<F> GenerationObserver for F
where
    F: FnMut(&GenerationResult, &[Individual]),
{
    fn on_generation(&mut self, result: &GenerationResult, ranked: &[Individual]) {
        self(result, ranked)
    }
}

/// Observer that keeps every [`GenerationResult`] for later plotting.
#[derive(Debug, Clone, Default)]
pub struct HistoryRecorder {
    /// Records in generation order.
    pub results: Vec<GenerationResult>,
}

impl HistoryRecorder {
    /// Average fitness per generation.
    pub fn fitness_history(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.average_fitness).collect()
    }

    /// Diversity rate per generation.
    pub fn diversity_history(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.diversity_rate).collect()
    }
}

impl GenerationObserver for HistoryRecorder {
    fn on_generation(&mut self, result: &GenerationResult, _ranked: &[Individual]) {
        self.results.push(*result);
    }
}

/// Result of a knapsack GA run.
#[derive(Debug, Clone)]
pub struct KnapsackResult {
    /// Best individual found during the entire run.
    pub best: FittestRecord,

    /// Packing encoded by `best`.
    pub solution: Solution,

    /// Number of generations evaluated, including the initial one.
    pub generations: usize,

    /// Why the run stopped.
    pub termination: TerminationReason,

    /// Average fitness of each generation.
    pub fitness_history: Vec<f64>,

    /// Diversity rate of each generation.
    pub diversity_history: Vec<f64>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```
/// use knapsack_ga::ga::{GaRunner, Item, KnapsackConfig};
///
/// let items = vec![Item::new(2.0, 3.0), Item::new(3.0, 4.0), Item::new(4.0, 5.0)];
/// let config = KnapsackConfig::new(items, 5.0)
///     .with_population_size(10)
///     .with_generations(50)
///     .with_seed(42);
/// let result = GaRunner::run(&config).unwrap();
/// assert!(result.solution.total_weight <= 5.0 || result.best.fitness <= 0.0);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA to termination.
    pub fn run(config: &KnapsackConfig) -> Result<KnapsackResult> {
        Self::run_with_cancel(config, &mut |_: &GenerationResult, _: &[Individual]| {}, None)
    }

    /// Runs the GA, reporting each generation to `observer`.
    pub fn run_with_observer<O: GenerationObserver>(
        config: &KnapsackConfig,
        observer: &mut O,
    ) -> Result<KnapsackResult> {
        Self::run_with_cancel(config, observer, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the GA stops after
    /// the current generation and returns the best solution found so far.
    pub fn run_with_cancel<O: GenerationObserver>(
        config: &KnapsackConfig,
        observer: &mut O,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<KnapsackResult> {
        let mut engine = EvolutionEngine::new(config.clone())?;
        let mut fitness_history = Vec::new();
        let mut diversity_history = Vec::new();

        while let Some(result) = engine.advance()? {
            fitness_history.push(result.average_fitness);
            diversity_history.push(result.diversity_rate);
            observer.on_generation(&result, engine.population());

            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    engine.cancel();
                }
            }
        }

        let best = engine.fittest().cloned().ok_or(GaError::EmptyPopulation)?;
        Ok(KnapsackResult {
            solution: solution(&best.chromosome, config),
            best,
            generations: engine.generation() + 1,
            termination: engine
                .termination()
                .unwrap_or(TerminationReason::GenerationLimit),
            fitness_history,
            diversity_history,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{DiversityPlateau, Item};
    use crate::random::create_rng;

    fn scenario_items() -> Vec<Item> {
        vec![
            Item::new(2.0, 3.0),
            Item::new(3.0, 4.0),
            Item::new(4.0, 5.0),
            Item::new(5.0, 6.0),
        ]
    }

    fn scenario_config() -> KnapsackConfig {
        KnapsackConfig::new(scenario_items(), 5.0)
            .with_population_size(4)
            .with_elitism_rate(0.2)
            .with_mating_pool_rate(0.5)
            .with_mutation_rate(0.05)
            .with_generations(200)
    }

    fn larger_config() -> KnapsackConfig {
        let items: Vec<Item> = (1..=12)
            .map(|i| Item::new(i as f64, (i * 3 % 7 + 1) as f64))
            .collect();
        KnapsackConfig::new(items, 20.0)
            .with_population_size(30)
            .with_generations(60)
            .with_elitism_rate(0.1)
            .with_mating_pool_rate(0.5)
            .with_mutation_rate(0.05)
    }

    fn evaluated(bits: &[&[u8]], config: &KnapsackConfig) -> Vec<Individual> {
        evaluate_population(bits.iter().map(|b| Chromosome::from_bits(b)).collect(), config)
    }

    // ---- FittestTracker ----

    #[test]
    fn test_tracker_only_replaces_on_strict_improvement() {
        let config = scenario_config();
        let mut tracker = FittestTracker::new();
        assert!(tracker.record().is_none());

        assert!(tracker.update(&evaluated(&[&[1, 0, 0, 0]], &config), 0));
        assert_eq!(tracker.record().map(|r| r.fitness), Some(3.0));

        // equal or worse fitness keeps the incumbent
        assert!(!tracker.update(&evaluated(&[&[1, 0, 0, 0]], &config), 1));
        assert!(!tracker.update(&evaluated(&[&[0, 0, 0, 0], &[1, 1, 1, 1]], &config), 2));
        assert_eq!(tracker.record().map(|r| r.generation), Some(0));
        assert!(tracker.update(&evaluated(&[&[1, 1, 0, 0]], &config), 3));

        let r = tracker.record().unwrap();
        assert_eq!(r.fitness, 7.0);
        assert_eq!(r.generation, 3);
        assert_eq!(r.chromosome, Chromosome::from_bits(&[1, 1, 0, 0]));
    }

    #[test]
    fn test_tracker_ignores_empty_population() {
        let mut tracker = FittestTracker::new();
        assert!(!tracker.update(&[], 0));
        assert!(tracker.record().is_none());
    }

    // ---- Strategies ----

    #[test]
    fn test_elitist_keeps_population_size() {
        let config = larger_config();
        let mut rng = create_rng(42);
        let pop = evaluate_population(generate_population(&config, &mut rng), &config);
        let next = reproduce_elitist(&pop, &config, &mut rng).unwrap();
        assert_eq!(next.len(), config.population_size);
        assert!(next.iter().all(|ind| ind.chromosome.len() == config.items.len()));
    }

    #[test]
    fn test_elitist_copies_elites_from_ranked_candidates() {
        // elites are copied unchanged from the top of the ranked sample
        let config = scenario_config()
            .with_elitism_rate(0.5)
            .with_mating_pool_rate(1.0);
        let mut rng = create_rng(3);
        let pop = evaluated(
            &[&[1, 1, 0, 0], &[1, 1, 0, 0], &[1, 1, 0, 0], &[1, 1, 0, 0]],
            &config,
        );
        let next = reproduce_elitist(&pop, &config, &mut rng).unwrap();
        assert_eq!(next.len(), 4);
        assert_eq!(next[0].chromosome, Chromosome::from_bits(&[1, 1, 0, 0]));
        assert_eq!(next[1].chromosome, Chromosome::from_bits(&[1, 1, 0, 0]));
    }

    #[test]
    fn test_elitist_full_elitism_copies_sample() {
        let config = scenario_config().with_elitism_rate(1.0);
        let mut rng = create_rng(42);
        let pop = evaluated(&[&[1, 1, 0, 0], &[0, 0, 0, 1], &[0, 0, 1, 0], &[1, 0, 0, 0]], &config);
        let next = reproduce_elitist(&pop, &config, &mut rng).unwrap();
        assert_eq!(next.len(), 4);
        assert!(next.iter().all(|ind| pop.contains(ind)));
    }

    #[test]
    fn test_elitist_empty_mating_pool_errors() {
        let mut config = scenario_config();
        config.mating_pool_rate = 0.0;
        let mut rng = create_rng(42);
        let pop = evaluated(&[&[1, 1, 0, 0], &[0, 0, 0, 1], &[0, 0, 1, 0], &[1, 0, 0, 0]], &config);
        assert_eq!(
            reproduce_elitist(&pop, &config, &mut rng),
            Err(GaError::EmptyMatingPool {
                pool: "mating",
                population_size: 4
            })
        );
    }

    #[test]
    fn test_fitter_child_drops_weaker_sibling() {
        let config = scenario_config();
        let pair = evaluated(&[&[1, 1, 0, 0], &[1, 0, 0, 0]], &config);
        assert_eq!(fitter_child(&pair[0], &pair[1]), &pair[0]);
        assert_eq!(fitter_child(&pair[1], &pair[0]), &pair[0]);

        // overweight (-18) loses to the empty packing (0)
        let pair = evaluated(&[&[1, 1, 1, 1], &[0, 0, 0, 0]], &config);
        assert_eq!(fitter_child(&pair[0], &pair[1]).fitness, 0.0);
    }

    #[test]
    fn test_fitter_child_tie_keeps_second() {
        let config = scenario_config();
        // identical genes: the second reference is returned
        let pair = evaluated(&[&[0, 1, 0, 0], &[0, 1, 0, 0]], &config);
        assert!(std::ptr::eq(fitter_child(&pair[0], &pair[1]), &pair[1]));

        let config = KnapsackConfig::new(vec![Item::new(1.0, 5.0), Item::new(1.0, 5.0)], 5.0);
        let pair = evaluated(&[&[1, 0], &[0, 1]], &config);
        assert_eq!(
            fitter_child(&pair[0], &pair[1]).chromosome,
            Chromosome::from_bits(&[0, 1])
        );
    }

    #[test]
    fn test_mutate_leading_only_touches_first_share() {
        let config = scenario_config()
            .with_mutation_rate(1.0)
            .with_mutation_population_rate(0.5);
        let children: Vec<Chromosome> = [
            [1u8, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 1],
            [1, 1, 0, 0],
            [0, 0, 1, 1],
        ]
        .iter()
        .map(|b| Chromosome::from_bits(b))
        .collect();
        let mut rng = create_rng(42);
        let out = mutate_leading(&children, &config, &mut rng);

        assert_eq!(out.len(), 6);
        for (before, after) in children[..3].iter().zip(&out[..3]) {
            let complement: Vec<bool> = before.genes().iter().map(|g| !g).collect();
            assert_eq!(after.genes(), complement.as_slice());
        }
        assert_eq!(&out[3..], &children[3..]);
    }

    #[test]
    fn test_mutate_leading_split_floors() {
        let config = scenario_config()
            .with_mutation_rate(1.0)
            .with_mutation_population_rate(0.5);
        let children = vec![Chromosome::from_bits(&[0, 0, 0, 0]); 3];
        let mut rng = create_rng(1);
        let out = mutate_leading(&children, &config, &mut rng);
        // floor(3 * 0.5) = 1 mutated
        assert_eq!(out[0], Chromosome::from_bits(&[1, 1, 1, 1]));
        assert_eq!(&out[1..], &children[1..]);
    }

    #[test]
    fn test_non_elitist_keeps_population_size() {
        for policy in [SurvivorPolicy::FitnessProportionate, SurvivorPolicy::Truncate] {
            // odd size exercises the truncated last pair
            let config = larger_config()
                .with_population_size(31)
                .with_strategy(Strategy::NonElitist)
                .with_survivor_policy(policy);
            let mut rng = create_rng(42);
            let pop = evaluate_population(generate_population(&config, &mut rng), &config);
            let next = reproduce_non_elitist(&pop, &config, &mut rng).unwrap();
            assert_eq!(next.len(), 31, "policy {policy:?}");
        }
    }

    #[test]
    fn test_non_elitist_truncate_never_loses_best() {
        let config = larger_config()
            .with_strategy(Strategy::NonElitist)
            .with_survivor_policy(SurvivorPolicy::Truncate);
        let mut rng = create_rng(9);
        let pop = evaluate_population(generate_population(&config, &mut rng), &config);
        let best = find_best(&pop).unwrap().fitness;
        let next = reproduce_non_elitist(&pop, &config, &mut rng).unwrap();
        assert!(next[0].fitness >= best);
        assert!(next.windows(2).all(|w| w[0].fitness >= w[1].fitness));
    }

    #[test]
    fn test_non_elitist_empty_parent_pool_errors() {
        let mut config = scenario_config().with_strategy(Strategy::NonElitist);
        config.selection_rate = 0.1;
        let mut rng = create_rng(42);
        let pop = evaluated(&[&[1, 1, 0, 0], &[0, 0, 0, 1], &[0, 0, 1, 0], &[1, 0, 0, 0]], &config);
        assert!(matches!(
            reproduce_non_elitist(&pop, &config, &mut rng),
            Err(GaError::EmptyMatingPool { pool: "parent", .. })
        ));
    }

    // ---- Engine ----

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = scenario_config().with_population_size(0);
        assert!(matches!(
            EvolutionEngine::new(config),
            Err(GaError::Config(_))
        ));
    }

    #[test]
    fn test_engine_runs_fixed_generations() {
        let config = scenario_config().with_generations(25).with_seed(1);
        let mut engine = EvolutionEngine::new(config).unwrap();
        let mut count = 0;
        while let Some(r) = engine.advance().unwrap() {
            assert_eq!(r.generation, count);
            assert_eq!(engine.population().len(), 4);
            count += 1;
        }
        assert_eq!(count, 25);
        assert_eq!(engine.termination(), Some(TerminationReason::GenerationLimit));
        assert!(engine.advance().unwrap().is_none());
    }

    #[test]
    fn test_engine_population_is_ranked() {
        let config = larger_config().with_seed(5);
        let mut engine = EvolutionEngine::new(config).unwrap();
        while engine.advance().unwrap().is_some() {
            let pop = engine.population();
            assert!(pop.windows(2).all(|w| w[0].fitness >= w[1].fitness));
        }
    }

    #[test]
    fn test_engine_with_injected_rng() {
        let config = scenario_config().with_generations(10);
        let mut a = EvolutionEngine::with_rng(config.clone(), create_rng(77)).unwrap();
        let mut b = EvolutionEngine::with_rng(config, create_rng(77)).unwrap();
        loop {
            let (ra, rb) = (a.advance().unwrap(), b.advance().unwrap());
            assert_eq!(ra, rb);
            if ra.is_none() {
                break;
            }
        }
        assert_eq!(a.fittest(), b.fittest());
    }

    #[test]
    fn test_engine_cancel() {
        let config = scenario_config().with_seed(3);
        let mut engine = EvolutionEngine::new(config).unwrap();
        engine.advance().unwrap();
        engine.cancel();
        assert!(engine.is_terminated());
        assert_eq!(engine.termination(), Some(TerminationReason::Cancelled));
        assert!(engine.advance().unwrap().is_none());
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_fittest_never_decreases() {
        for strategy in [Strategy::Elitist, Strategy::NonElitist] {
            let config = larger_config().with_strategy(strategy).with_seed(11);
            let mut engine = EvolutionEngine::new(config).unwrap();
            let mut last = f64::NEG_INFINITY;
            while let Some(r) = engine.advance().unwrap() {
                let best = engine.fittest().unwrap().fitness;
                assert!(best >= last);
                assert!(best >= r.best_fitness);
                last = best;
            }
        }
    }

    #[test]
    fn test_convergence_mode_stops_on_collapse() {
        let config = scenario_config()
            .with_mutation_rate(0.0)
            .with_termination(Termination::Convergence {
                diversity_threshold: None,
                plateau: None,
                max_generations: Some(5_000),
            })
            .with_seed(42);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.termination, TerminationReason::Converged);
        assert!(result.generations < 5_000);
        let last = *result.diversity_history.last().unwrap();
        assert!(last <= 0.25 + 1e-12, "final diversity {last}");
        // every earlier generation was still above the threshold
        let earlier = &result.diversity_history[..result.diversity_history.len() - 1];
        assert!(earlier.iter().all(|&d| d > 0.25 + 1e-12));
    }

    #[test]
    fn test_convergence_mode_plateau() {
        let config = larger_config()
            .with_termination(Termination::Convergence {
                diversity_threshold: Some(0.0),
                plateau: Some(DiversityPlateau {
                    diversity_rate_diff: 1.0,
                    patience: 3,
                }),
                max_generations: None,
            })
            .with_seed(42);
        // every change is within 1.0, so the guard fires after 3 flat steps
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.termination, TerminationReason::Plateau);
        assert_eq!(result.generations, 4);
    }

    #[test]
    fn test_convergence_mode_generation_cap() {
        let config = larger_config()
            .with_termination(Termination::Convergence {
                diversity_threshold: Some(0.0),
                plateau: None,
                max_generations: Some(7),
            })
            .with_seed(42);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.termination, TerminationReason::GenerationLimit);
        assert_eq!(result.generations, 7);
    }

    // ---- Runner ----

    #[test]
    fn test_scenario_run_shape() {
        let config = scenario_config().with_seed(42);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.generations, 200);
        assert_eq!(result.fitness_history.len(), 200);
        assert_eq!(result.termination, TerminationReason::GenerationLimit);
        assert!(result.best.fitness <= 7.0);
        assert_eq!(
            result.best.fitness,
            crate::ga::fitness(&result.best.chromosome, &config)
        );
    }

    #[test]
    fn test_scenario_reaches_optimum_across_seeds() {
        // item0 + item1: weight 5, value 7. Four individuals converge early,
        // so only a share of the seeds reach it.
        let hits: Vec<u64> = (0..40)
            .filter(|&seed| {
                let config = scenario_config().with_seed(seed);
                GaRunner::run(&config).unwrap().best.fitness == 7.0
            })
            .collect();
        assert!(hits.len() >= 15, "optimum found for {}/40 seeds", hits.len());

        let config = scenario_config().with_seed(hits[0]);
        let result = GaRunner::run(&config).unwrap();
        assert_eq!(result.solution.selected_items, vec![0, 1]);
        assert_eq!(result.solution.total_weight, 5.0);
        assert_eq!(result.solution.total_value, 7.0);
    }

    #[test]
    fn test_best_fitness_bounded_by_optimum() {
        for strategy in [Strategy::Elitist, Strategy::NonElitist] {
            let config = scenario_config().with_strategy(strategy).with_seed(8);
            let result = GaRunner::run(&config).unwrap();
            assert!(result.best.fitness <= 7.0);
            assert!(result.solution.is_feasible(5.0) || result.best.fitness <= 0.0);
        }
    }

    #[test]
    fn test_runner_observer_and_histories() {
        let config = larger_config().with_seed(4);
        let mut recorder = HistoryRecorder::default();
        let result = GaRunner::run_with_observer(&config, &mut recorder).unwrap();

        assert_eq!(recorder.results.len(), 60);
        assert_eq!(recorder.fitness_history(), result.fitness_history);
        assert_eq!(recorder.diversity_history(), result.diversity_history);
        assert!(result
            .diversity_history
            .iter()
            .all(|&d| d > 0.0 && d <= 1.0));
    }

    #[test]
    fn test_closure_observer_sees_ranked_population() {
        let config = larger_config().with_seed(4).with_generations(5);
        let mut sizes = Vec::new();
        let mut observer = |r: &GenerationResult, ranked: &[Individual]| {
            assert_eq!(ranked[0].fitness, r.best_fitness);
            sizes.push(ranked.len());
        };
        GaRunner::run_with_observer(&config, &mut observer).unwrap();
        assert_eq!(sizes, vec![30; 5]);
    }

    #[test]
    fn test_cancellation() {
        let config = larger_config().with_generations(10_000).with_seed(42);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = GaRunner::run_with_cancel(
            &config,
            &mut |_: &GenerationResult, _: &[Individual]| {},
            Some(cancel),
        )
        .unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert_eq!(result.generations, 1);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        for strategy in [Strategy::Elitist, Strategy::NonElitist] {
            let config = larger_config().with_strategy(strategy).with_seed(123);
            let a = GaRunner::run(&config).unwrap();
            let b = GaRunner::run(&config).unwrap();
            assert_eq!(a.fitness_history, b.fitness_history);
            assert_eq!(a.diversity_history, b.diversity_history);
            assert_eq!(a.best, b.best);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let config = larger_config().with_seed(321);
        let seq = GaRunner::run(&config).unwrap();
        let par = GaRunner::run(&config.clone().with_parallel(true)).unwrap();
        assert_eq!(seq.fitness_history, par.fitness_history);
        assert_eq!(seq.best, par.best);
    }
}
