//! Fitness evaluation.
//!
//! Fitness is the total value of the packed items. An overweight packing
//! scores the negated total value, so infeasible selections rank below every
//! feasible one while heavier-but-richer selections still point the search
//! towards good regions.

use super::config::KnapsackConfig;
use super::types::{Chromosome, Individual, Item, Solution};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sums `(weight, value)` of the selected items.
fn totals(chromosome: &Chromosome, items: &[Item]) -> (f64, f64) {
    chromosome
        .genes()
        .iter()
        .zip(items)
        .filter(|(&g, _)| g)
        .fold((0.0, 0.0), |(w, v), (_, item)| {
            (w + item.weight, v + item.value)
        })
}

/// Scores a chromosome against the configured items and capacity.
pub fn fitness(chromosome: &Chromosome, config: &KnapsackConfig) -> f64 {
    let (total_weight, total_value) = totals(chromosome, &config.items);
    if total_weight > config.capacity {
        -total_value
    } else {
        total_value
    }
}

/// Derives the packing encoded by a chromosome.
pub fn solution(chromosome: &Chromosome, config: &KnapsackConfig) -> Solution {
    let (total_weight, total_value) = totals(chromosome, &config.items);
    Solution {
        selected_items: chromosome.selected().collect(),
        total_weight,
        total_value,
    }
}

/// Scores every chromosome, in parallel when enabled.
pub fn evaluate_population(
    chromosomes: Vec<Chromosome>,
    config: &KnapsackConfig,
) -> Vec<Individual> {
    #[cfg(feature = "parallel")]
    {
        if config.parallel {
            return chromosomes
                .into_par_iter()
                .map(|chromosome| {
                    let fitness = fitness(&chromosome, config);
                    Individual {
                        chromosome,
                        fitness,
                    }
                })
                .collect();
        }
    }

    chromosomes
        .into_iter()
        .map(|chromosome| {
            let fitness = fitness(&chromosome, config);
            Individual {
                chromosome,
                fitness,
            }
        })
        .collect()
}

/// Sorts individuals by fitness, best first. The sort is stable.
pub fn sort_by_fitness_desc(population: &mut [Individual]) {
    population.sort_by(|a, b| {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Mean fitness of a population; `0.0` when empty.
pub fn average_fitness(population: &[Individual]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|ind| ind.fitness).sum::<f64>() / population.len() as f64
}

/// Returns the individual with the highest fitness (first one on ties).
pub fn find_best(population: &[Individual]) -> Option<&Individual> {
    population.iter().reduce(|best, ind| {
        if ind.fitness > best.fitness {
            ind
        } else {
            best
        }
    })
}
