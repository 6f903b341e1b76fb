//! GA configuration.
//!
//! [`KnapsackConfig`] holds the problem instance together with every
//! parameter that controls the evolutionary loop.

use super::types::Item;
use crate::error::{GaError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reproduction strategy applied once per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Roulette-sampled candidates are ranked; the top `elitism_rate` survive
    /// unchanged and the rest of the generation is bred from a ranked mating
    /// pool, keeping the fitter of each pair of children.
    #[default]
    Elitist,

    /// A roulette-selected parent pool breeds a full generation of children,
    /// a leading share of which is mutated. Parents and children then compete
    /// for survival according to [`SurvivorPolicy`].
    NonElitist,
}

/// How [`Strategy::NonElitist`] picks survivors from the combined pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SurvivorPolicy {
    /// Roulette resampling of the ranked pool (with replacement).
    #[default]
    FitnessProportionate,

    /// Keep the `population_size` fittest individuals.
    Truncate,
}

/// Diversity plateau guard for convergence mode.
///
/// The run counts as converged after `patience` consecutive generations in
/// which the diversity rate moved by at most `diversity_rate_diff`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiversityPlateau {
    /// Maximum absolute change that still counts as "flat".
    pub diversity_rate_diff: f64,
    /// Consecutive flat generations needed to stop.
    #[cfg_attr(feature = "serde", serde(alias = "diversity_rate_diff_cnt"))]
    pub patience: usize,
}

/// When the generation loop stops.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Termination {
    /// Run exactly this many generations (counting the initial one).
    Generations(usize),

    /// Run until genotype diversity collapses.
    Convergence {
        /// Stop once `diversity_rate <= threshold`.
        ///
        /// `None` uses `1 / population_size`.
        diversity_threshold: Option<f64>,
        /// Optional plateau guard.
        plateau: Option<DiversityPlateau>,
        /// Optional hard cap on the number of generations.
        max_generations: Option<usize>,
    },
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Generations(200)
    }
}

impl Termination {
    /// Convergence mode with the default threshold and no plateau guard.
    pub fn convergence() -> Self {
        Termination::Convergence {
            diversity_threshold: None,
            plateau: None,
            max_generations: None,
        }
    }
}

/// Configuration for a knapsack GA run.
///
/// # Defaults
///
/// ```
/// use knapsack_ga::ga::{KnapsackConfig, Strategy, Termination};
///
/// let config = KnapsackConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.strategy, Strategy::Elitist);
/// assert_eq!(config.termination, Termination::Generations(200));
/// ```
///
/// # Builder Pattern
///
/// ```
/// use knapsack_ga::ga::{Item, KnapsackConfig, Strategy};
///
/// let config = KnapsackConfig::new(vec![Item::new(2.0, 3.0), Item::new(3.0, 4.0)], 5.0)
///     .with_population_size(20)
///     .with_strategy(Strategy::NonElitist)
///     .with_mutation_rate(0.02)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KnapsackConfig {
    /// Items to choose from. Chromosome length equals `items.len()`.
    pub items: Vec<Item>,

    /// Maximum total weight of a feasible packing.
    pub capacity: f64,

    /// Number of individuals in every generation.
    pub population_size: usize,

    /// Stopping rule.
    pub termination: Termination,

    /// Reproduction strategy.
    pub strategy: Strategy,

    /// Per-gene flip probability (0.0–1.0).
    pub mutation_rate: f64,

    /// Fraction of the ranked candidates copied unchanged (0.0–1.0).
    ///
    /// Used by [`Strategy::Elitist`].
    pub elitism_rate: f64,

    /// Fraction of the non-elite ranked candidates eligible as parents (0.0–1.0).
    ///
    /// Used by [`Strategy::Elitist`].
    pub mating_pool_rate: f64,

    /// Parent pool size as a fraction of the population (0.0 exclusive–1.0).
    ///
    /// Used by [`Strategy::NonElitist`].
    pub selection_rate: f64,

    /// Leading fraction of the children that gets mutated (0.0–1.0).
    ///
    /// Used by [`Strategy::NonElitist`].
    pub mutation_population_rate: f64,

    /// Survivor rule for [`Strategy::NonElitist`].
    pub survivor_policy: SurvivorPolicy,

    /// Whether to evaluate fitness in parallel using rayon.
    ///
    /// Has no effect without the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            capacity: 0.0,
            population_size: 100,
            termination: Termination::default(),
            strategy: Strategy::default(),
            mutation_rate: 0.05,
            elitism_rate: 0.2,
            mating_pool_rate: 0.5,
            selection_rate: 0.5,
            mutation_population_rate: 0.5,
            survivor_policy: SurvivorPolicy::default(),
            parallel: false,
            seed: None,
        }
    }
}

impl KnapsackConfig {
    /// Creates a configuration for the given problem instance with default
    /// algorithm parameters.
    pub fn new(items: Vec<Item>, capacity: f64) -> Self {
        Self {
            items,
            capacity,
            ..Self::default()
        }
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Runs a fixed number of generations.
    pub fn with_generations(mut self, n: usize) -> Self {
        self.termination = Termination::Generations(n);
        self
    }

    /// Sets the stopping rule.
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Sets the reproduction strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    /// Sets the mating pool rate.
    pub fn with_mating_pool_rate(mut self, rate: f64) -> Self {
        self.mating_pool_rate = rate;
        self
    }

    /// Sets the parent selection rate.
    pub fn with_selection_rate(mut self, rate: f64) -> Self {
        self.selection_rate = rate;
        self
    }

    /// Sets the mutated share of the children.
    pub fn with_mutation_population_rate(mut self, rate: f64) -> Self {
        self.mutation_population_rate = rate;
        self
    }

    /// Sets the survivor policy.
    pub fn with_survivor_policy(mut self, policy: SurvivorPolicy) -> Self {
        self.survivor_policy = policy;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of elites kept by [`Strategy::Elitist`].
    pub fn elitism_size(&self) -> usize {
        (self.population_size as f64 * self.elitism_rate) as usize
    }

    /// Mating pool size used by [`Strategy::Elitist`].
    pub fn mating_pool_size(&self) -> usize {
        let remaining = self.population_size - self.elitism_size().min(self.population_size);
        (remaining as f64 * self.mating_pool_rate) as usize
    }

    /// Parent pool size used by [`Strategy::NonElitist`].
    pub fn parent_pool_size(&self) -> usize {
        (self.population_size as f64 * self.selection_rate) as usize
    }

    /// Diversity threshold in effect for convergence mode.
    pub fn diversity_threshold(&self) -> f64 {
        match self.termination {
            Termination::Convergence {
                diversity_threshold: Some(t),
                ..
            } => t,
            _ => 1.0 / self.population_size.max(1) as f64,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns [`GaError::Config`] for out-of-range fields and
    /// [`GaError::EmptyMatingPool`] when the chosen strategy would breed from
    /// an empty pool.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(GaError::Config("items must not be empty".into()));
        }
        if let Some(i) = self
            .items
            .iter()
            .position(|it| !it.weight.is_finite() || !it.value.is_finite())
        {
            return Err(GaError::Config(format!(
                "item {i} has a non-finite weight or value"
            )));
        }
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(GaError::Config("capacity must be positive".into()));
        }
        if self.population_size == 0 {
            return Err(GaError::Config(
                "population_size must be at least 1".into(),
            ));
        }

        check_rate("mutation_rate", self.mutation_rate)?;
        check_rate("elitism_rate", self.elitism_rate)?;
        check_rate("mating_pool_rate", self.mating_pool_rate)?;
        check_rate("mutation_population_rate", self.mutation_population_rate)?;
        check_rate("selection_rate", self.selection_rate)?;
        if self.selection_rate == 0.0 {
            return Err(GaError::Config("selection_rate must be in (0, 1]".into()));
        }

        match self.termination {
            Termination::Generations(0) => {
                return Err(GaError::Config("generations must be at least 1".into()));
            }
            Termination::Generations(_) => {}
            Termination::Convergence {
                diversity_threshold,
                plateau,
                max_generations,
            } => {
                if let Some(t) = diversity_threshold {
                    check_rate("diversity_threshold", t)?;
                }
                if let Some(p) = plateau {
                    if !p.diversity_rate_diff.is_finite() || p.diversity_rate_diff < 0.0 {
                        return Err(GaError::Config(
                            "diversity_rate_diff must be non-negative".into(),
                        ));
                    }
                    if p.patience == 0 {
                        return Err(GaError::Config(
                            "diversity_rate_diff_cnt must be at least 1".into(),
                        ));
                    }
                }
                if max_generations == Some(0) {
                    return Err(GaError::Config(
                        "max_generations must be positive or None".into(),
                    ));
                }
            }
        }

        match self.strategy {
            Strategy::Elitist => {
                let elites = self.elitism_size();
                if elites < self.population_size && self.mating_pool_size() == 0 {
                    return Err(GaError::EmptyMatingPool {
                        pool: "mating",
                        population_size: self.population_size,
                    });
                }
            }
            Strategy::NonElitist => {
                if self.parent_pool_size() == 0 {
                    return Err(GaError::EmptyMatingPool {
                        pool: "parent",
                        population_size: self.population_size,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_rate(name: &str, rate: f64) -> Result<()> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(GaError::Config(format!("{name} must be in [0, 1], got {rate}")))
    }
}
