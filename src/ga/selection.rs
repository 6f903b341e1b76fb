//! Fitness-proportionate (roulette wheel) selection.
//!
//! Fitness here is maximized and may be negative (overweight packings), so
//! raw values cannot be used as wheel weights directly. Every fitness is
//! shifted by `+|min fitness|` first, which keeps the ranking and makes the
//! weights non-negative.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"

use super::types::Individual;
use crate::error::{GaError, Result};
use rand::Rng;
use tracing::debug;

/// Cumulative selection probabilities for a set of fitness values.
///
/// # Errors
/// [`GaError::DegenerateSelection`] when the shifted fitness sum is zero
/// (every individual ties at the minimum).
pub fn cumulative_distribution(fitnesses: &[f64]) -> Result<Vec<f64>> {
    let min = fitnesses.iter().cloned().fold(f64::INFINITY, f64::min);
    let shift = min.abs();

    let shifted: Vec<f64> = fitnesses.iter().map(|&f| f + shift).collect();
    let total: f64 = shifted.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(GaError::DegenerateSelection);
    }

    let mut cumulative = 0.0;
    Ok(shifted
        .iter()
        .map(|&w| {
            cumulative += w / total;
            cumulative
        })
        .collect())
}

/// Samples `k` indices into `population`, with replacement, proportionally
/// to shifted fitness.
///
/// Falls back to uniform sampling when the distribution is degenerate.
///
/// # Errors
/// [`GaError::EmptyPopulation`] if `population` is empty.
///
/// # Complexity
/// O(n + k log n)
pub fn roulette_indices<R: Rng>(
    population: &[Individual],
    k: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let n = population.len();
    if n == 0 {
        return Err(GaError::EmptyPopulation);
    }

    let fitnesses: Vec<f64> = population.iter().map(|ind| ind.fitness).collect();
    let cumulative = match cumulative_distribution(&fitnesses) {
        Ok(c) => c,
        Err(GaError::DegenerateSelection) => {
            debug!(population = n, "all fitness tied, sampling uniformly");
            return Ok((0..k).map(|_| rng.random_range(0..n)).collect());
        }
        Err(e) => return Err(e),
    };

    let live = last_live(&cumulative);
    Ok((0..k).map(|_| spin(&cumulative, live, rng.random())).collect())
}

/// Index of the last slot with non-zero weight.
///
/// Rounding can leave the final cumulative value just below 1.0. Draws that
/// land past it must go to a slot that can actually win, never to a trailing
/// zero-weight one.
fn last_live(cumulative: &[f64]) -> usize {
    (0..cumulative.len())
        .rev()
        .find(|&i| {
            let previous = if i == 0 { 0.0 } else { cumulative[i - 1] };
            cumulative[i] > previous
        })
        .unwrap_or(0)
}

/// First index whose cumulative probability strictly exceeds `r`, clamped
/// to `last_live`.
fn spin(cumulative: &[f64], last_live: usize, r: f64) -> usize {
    cumulative.partition_point(|&c| c <= r).min(last_live)
}

/// Samples `k` individuals (cloned) by roulette wheel.
pub fn select<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> Result<Vec<Individual>> {
    Ok(roulette_indices(population, k, rng)?
        .into_iter()
        .map(|i| population[i].clone())
        .collect())
}
