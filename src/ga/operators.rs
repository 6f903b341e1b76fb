//! Bit-string genetic operators.
//!
//! Random initialization, uniform crossover and per-gene bit-flip mutation
//! for [`Chromosome`]s. Every operator returns new chromosomes and leaves its
//! inputs untouched.
//!
//! # Operators
//!
//! - [`generate_chromosome`] / [`generate_population`]: Bernoulli(0.5) genes
//! - [`uniform_crossover`]: Syswerda (1989) — random mask, two complementary children
//! - [`bit_flip_mutation`]: independent flip of each gene with probability `mutation_rate`
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

use super::config::KnapsackConfig;
use super::types::Chromosome;
use crate::error::{GaError, Result};
use rand::distr::OpenClosed01;
use rand::Rng;

// ============================================================================
// Initialization
// ============================================================================

/// Creates a chromosome of `length` independent fair-coin genes.
pub fn generate_chromosome<R: Rng>(length: usize, rng: &mut R) -> Chromosome {
    Chromosome::new((0..length).map(|_| rng.random_bool(0.5)).collect())
}

/// Creates `population_size` random chromosomes sized to the item list.
///
/// Duplicates are allowed.
pub fn generate_population<R: Rng>(config: &KnapsackConfig, rng: &mut R) -> Vec<Chromosome> {
    (0..config.population_size)
        .map(|_| generate_chromosome(config.items.len(), rng))
        .collect()
}

// ============================================================================
// Crossover
// ============================================================================

/// Uniform crossover.
///
/// Draws a random bit mask; the first child copies `parent1` where the mask
/// is set and `parent2` elsewhere, the second child takes the complementary
/// genes.
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Errors
/// [`GaError::LengthMismatch`] if the parents have different lengths.
pub fn uniform_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome)> {
    let n = parent1.len();
    if parent2.len() != n {
        return Err(GaError::LengthMismatch {
            expected: n,
            actual: parent2.len(),
        });
    }

    let mut child1 = Vec::with_capacity(n);
    let mut child2 = Vec::with_capacity(n);
    for (&a, &b) in parent1.genes().iter().zip(parent2.genes()) {
        if rng.random_bool(0.5) {
            child1.push(a);
            child2.push(b);
        } else {
            child1.push(b);
            child2.push(a);
        }
    }

    Ok((Chromosome::new(child1), Chromosome::new(child2)))
}

// ============================================================================
// Mutation
// ============================================================================

/// Bit-flip mutation.
///
/// Each gene draws a uniform value in `(0, 1]` and is flipped when the draw
/// is `<= mutation_rate`. A rate of `0.0` never flips and a rate of `1.0`
/// returns the exact complement.
///
/// # Complexity
/// O(n)
pub fn bit_flip_mutation<R: Rng>(
    chromosome: &Chromosome,
    mutation_rate: f64,
    rng: &mut R,
) -> Chromosome {
    Chromosome::new(
        chromosome
            .genes()
            .iter()
            .map(|&g| {
                let u: f64 = rng.sample(OpenClosed01);
                if u <= mutation_rate {
                    !g
                } else {
                    g
                }
            })
            .collect(),
    )
}

/// Applies [`bit_flip_mutation`] with the configured `mutation_rate`.
pub fn mutate<R: Rng>(chromosome: &Chromosome, config: &KnapsackConfig, rng: &mut R) -> Chromosome {
    bit_flip_mutation(chromosome, config.mutation_rate, rng)
}

// ============================================================================
// Tests
// ============================================================================
