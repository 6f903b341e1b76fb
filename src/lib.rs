//! Genetic algorithm engine for the 0/1 knapsack problem.
//!
//! A population of item selections evolves over generations via
//! fitness-proportionate selection, uniform crossover and bit-flip mutation,
//! with one of two reproduction strategies:
//!
//! - **Elitist**: the top-ranked individuals survive unchanged; the rest are
//!   bred from a ranked mating pool.
//! - **Non-elitist**: a full generation of children competes with its
//!   parents for survival.
//!
//! The run stops after a fixed number of generations or when genotype
//! diversity collapses. The best solution ever seen is reported, since
//! neither strategy guarantees monotonic improvement.
//!
//! Overweight selections score the negated total value. The search is a
//! heuristic and does not guarantee optimality.
//!
//! # Example
//!
//! ```
//! use knapsack_ga::ga::{GaRunner, Item, KnapsackConfig};
//!
//! let items = vec![
//!     Item::new(2.0, 3.0),
//!     Item::new(3.0, 4.0),
//!     Item::new(4.0, 5.0),
//!     Item::new(5.0, 6.0),
//! ];
//! let config = KnapsackConfig::new(items, 5.0)
//!     .with_population_size(20)
//!     .with_generations(100)
//!     .with_seed(42);
//!
//! let result = GaRunner::run(&config).unwrap();
//! assert!(result.best.fitness <= 7.0);
//! ```

pub mod error;
pub mod ga;
pub mod random;

pub use error::{GaError, Result};
