//! Core data types for the knapsack GA.
//!
//! [`Item`] and [`Chromosome`] describe the problem and its encoding;
//! [`Individual`] pairs a chromosome with its cached fitness. The remaining
//! types are records produced by the engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An item that may be packed into the knapsack.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// Weight counted against the capacity.
    pub weight: f64,
    /// Value gained when the item is packed.
    pub value: f64,
}

impl Item {
    /// Creates an item.
    pub fn new(weight: f64, value: f64) -> Self {
        Self { weight, value }
    }
}

/// A fixed-length bit vector encoding an item selection.
///
/// Gene `i` set means item `i` is packed. Chromosomes are immutable: the
/// operators in [`super::operators`] always return new chromosomes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chromosome {
    genes: Vec<bool>,
}

impl Chromosome {
    /// Wraps a gene vector.
    pub fn new(genes: Vec<bool>) -> Self {
        Self { genes }
    }

    /// Builds a chromosome from `0`/`1` values; any non-zero value is a set gene.
    pub fn from_bits(bits: &[u8]) -> Self {
        Self {
            genes: bits.iter().map(|&b| b != 0).collect(),
        }
    }

    /// Read-only view of the genes.
    pub fn genes(&self) -> &[bool] {
        &self.genes
    }

    /// Number of genes (equals the item count).
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the chromosome has no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Indices of the selected items.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.genes
            .iter()
            .enumerate()
            .filter(|(_, &g)| g)
            .map(|(i, _)| i)
    }

    /// Genes as `0`/`1` values.
    pub fn to_bits(&self) -> Vec<u8> {
        self.genes.iter().map(|&g| u8::from(g)).collect()
    }
}

impl std::fmt::Display for Chromosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &g in &self.genes {
            f.write_str(if g { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// A chromosome together with its fitness.
///
/// Higher fitness is better (maximization).
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// The encoded selection.
    pub chromosome: Chromosome,
    /// Cached result of [`super::fitness::fitness`].
    pub fitness: f64,
}

/// Best-ever solution seen during a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FittestRecord {
    /// The best chromosome.
    pub chromosome: Chromosome,
    /// Its fitness.
    pub fitness: f64,
    /// Generation in which it was first seen.
    pub generation: usize,
}

/// Per-generation statistics handed to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationResult {
    /// Zero-based generation index.
    pub generation: usize,
    /// Mean fitness of the population.
    pub average_fitness: f64,
    /// Fraction of genotypically unique individuals.
    pub diversity_rate: f64,
    /// Fitness of the best individual in this generation.
    pub best_fitness: f64,
}

/// Packing derived from a chromosome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// Indices of the packed items.
    pub selected_items: Vec<usize>,
    /// Sum of packed weights.
    pub total_weight: f64,
    /// Sum of packed values.
    pub total_value: f64,
}

impl Solution {
    /// Returns `true` if the packing fits in `capacity`.
    pub fn is_feasible(&self, capacity: f64) -> bool {
        self.total_weight <= capacity
    }
}
