//! Error types for the knapsack GA.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GaError>;

/// Errors raised by configuration validation and the genetic operators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GaError {
    /// A configuration field is missing or outside its valid range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Every individual has the same shifted fitness (sum is zero), so no
    /// proportional distribution can be built.
    ///
    /// Selection handles this by falling back to uniform sampling.
    #[error("degenerate selection: shifted fitness sum is zero")]
    DegenerateSelection,

    /// A computed mating or parent pool has no members.
    #[error("{pool} pool is empty (population_size = {population_size})")]
    EmptyMatingPool {
        /// Which pool came out empty (`"mating"` or `"parent"`).
        pool: &'static str,
        /// Population size the pool was derived from.
        population_size: usize,
    },

    /// Selection was asked to sample from an empty population.
    #[error("cannot select from empty population")]
    EmptyPopulation,

    /// Two chromosomes that must share a length do not.
    #[error("chromosome length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length of the first chromosome.
        expected: usize,
        /// Length of the second chromosome.
        actual: usize,
    },
}
