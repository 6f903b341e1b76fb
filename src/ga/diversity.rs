//! Genotype diversity tracking.
//!
//! [`diversity_rate`] measures how many distinct chromosomes a population
//! holds. [`DiversityMonitor`] turns the per-generation rates into a
//! convergence decision.

use super::config::DiversityPlateau;
use super::types::Individual;
use std::collections::HashSet;

/// Fraction of genotypically unique individuals.
///
/// Returns `0.0` for an empty population; any non-empty population yields a
/// value in `[1/n, 1]`.
pub fn diversity_rate(population: &[Individual]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<_> = population.iter().map(|ind| &ind.chromosome).collect();
    distinct.len() as f64 / population.len() as f64
}

/// Why the monitor considers the run converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// Diversity fell to or below the threshold.
    Collapsed,
    /// Diversity stopped moving for the configured number of generations.
    Plateau,
}

/// Convergence detector fed once per generation.
#[derive(Debug, Clone)]
pub struct DiversityMonitor {
    threshold: f64,
    plateau: Option<DiversityPlateau>,
    previous: Option<f64>,
    flat_generations: usize,
}

impl DiversityMonitor {
    /// Creates a monitor that reports collapse at `threshold` and, when
    /// `plateau` is set, a plateau after `patience` flat generations.
    pub fn new(threshold: f64, plateau: Option<DiversityPlateau>) -> Self {
        Self {
            threshold,
            plateau,
            previous: None,
            flat_generations: 0,
        }
    }

    /// Records the diversity rate of the latest generation and returns the
    /// convergence state after it.
    pub fn observe(&mut self, rate: f64) -> Option<Convergence> {
        if let (Some(plateau), Some(previous)) = (self.plateau, self.previous) {
            if (rate - previous).abs() <= plateau.diversity_rate_diff {
                self.flat_generations += 1;
            } else {
                self.flat_generations = 0;
            }
        }
        self.previous = Some(rate);

        if rate <= self.threshold {
            Some(Convergence::Collapsed)
        } else if self
            .plateau
            .is_some_and(|p| self.flat_generations >= p.patience)
        {
            Some(Convergence::Plateau)
        } else {
            None
        }
    }

    /// Consecutive generations with a flat diversity rate so far.
    pub fn flat_generations(&self) -> usize {
        self.flat_generations
    }
}
