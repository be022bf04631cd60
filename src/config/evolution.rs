use super::traits::ConfigSection;
use crate::error::GondolaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Upper bound of the next breeding population
    pub population_size: usize,
    pub seed: u64,
    pub num_generations: usize,
    /// Scored candidates bred per generation
    pub candidates_per_generation: usize,
    /// Attempts `next_individual` makes before giving up
    pub max_attempts: usize,
    pub min_depth: usize,
    pub max_depth: usize,
    /// Chance in percent that a bred rule is mutated
    pub mutation_percent: u32,
    pub breed_weights: BreedWeights,
}

/// Relative weights of the breed types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedWeights {
    pub clone: u32,
    pub swap: u32,
    pub recombine: u32,
    pub swap_recombine: u32,
    pub double_recombine: u32,
}

impl Default for BreedWeights {
    fn default() -> Self {
        Self {
            clone: 10,
            swap: 5,
            recombine: 35,
            swap_recombine: 40,
            double_recombine: 10,
        }
    }
}

impl BreedWeights {
    /// Sum of the weights, `None` when it does not fit a `u32`.
    pub fn total(&self) -> Option<u32> {
        [self.swap, self.recombine, self.swap_recombine, self.double_recombine]
            .into_iter()
            .try_fold(self.clone, u32::checked_add)
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            seed: 42,
            num_generations: 20,
            candidates_per_generation: 200,
            max_attempts: 10_000,
            min_depth: 2,
            max_depth: 8,
            mutation_percent: 30,
            breed_weights: BreedWeights::default(),
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), GondolaError> {
        if self.population_size == 0 {
            return Err(GondolaError::Configuration(
                "Population size must be at least 1".to_string()
            ));
        }
        if self.max_attempts == 0 {
            return Err(GondolaError::Configuration(
                "Max attempts must be at least 1".to_string()
            ));
        }
        if self.min_depth == 0 || self.min_depth > self.max_depth {
            return Err(GondolaError::Configuration(format!(
                "Depth range {}..={} is empty",
                self.min_depth, self.max_depth
            )));
        }
        if self.mutation_percent > 100 {
            return Err(GondolaError::Configuration(
                "Mutation percent must be between 0 and 100".to_string()
            ));
        }
        match self.breed_weights.total() {
            None => {
                return Err(GondolaError::Configuration(
                    "Breed weights must sum to at most 4294967295".to_string()
                ));
            }
            Some(0) => {
                return Err(GondolaError::Configuration(
                    "At least one breed weight must be positive".to_string()
                ));
            }
            Some(_) => {}
        }
        Ok(())
    }
}
