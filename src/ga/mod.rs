//! Genetic Algorithm for the 0/1 knapsack problem.
//!
//! A population of bit-string chromosomes evolves through roulette
//! selection, uniform crossover and bit-flip mutation until a generation
//! budget runs out or genotype diversity collapses.
//!
//! # Key Types
//!
//! - [`KnapsackConfig`]: Problem instance and algorithm parameters
//! - [`EvolutionEngine`]: Pull-driven engine, one generation per `advance()`
//! - [`GaRunner`]: Runs an engine to termination and returns a [`KnapsackResult`]
//! - [`GenerationObserver`]: Per-generation reporting hook
//!
//! # Submodules
//!
//! - [`operators`]: Random initialization, uniform crossover, bit-flip mutation
//! - [`selection`]: Fitness-proportionate selection safe for negative fitness
//! - [`diversity`]: Diversity rate and convergence detection
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Martello & Toth (1990), *Knapsack Problems: Algorithms and Computer Implementations*

mod config;
pub mod diversity;
mod fitness;
pub mod operators;
mod runner;
pub mod selection;
mod types;

pub use config::{DiversityPlateau, KnapsackConfig, Strategy, SurvivorPolicy, Termination};
pub use diversity::{diversity_rate, DiversityMonitor};
pub use fitness::{average_fitness, evaluate_population, fitness, solution, sort_by_fitness_desc};
pub use runner::{
    reproduce_elitist, reproduce_non_elitist, EvolutionEngine, FittestTracker, GaRunner,
    GenerationObserver, HistoryRecorder, KnapsackResult, TerminationReason,
};
pub use types::{Chromosome, FittestRecord, GenerationResult, Individual, Item, Solution};
