use super::individual::{BreedType, Individual};
use super::mutator::Mutator;
use super::population::Population;
use super::progress::ProgressCallback;
use crate::{
    config::{ConfigSection, EvolutionConfig},
    engines::evaluation::PaperTrade,
    error::{GondolaError, Result},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A retained individual as written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRule {
    pub buy_rule: String,
    pub sell_rule: String,
    pub fitness: f64,
    pub breed_type: BreedType,
}

/// Breeds buy/sell rule pairs against a paper trader.
///
/// Candidates are bred from the breeding population and offered to the next
/// breeding population, which survives across generations and is copied
/// into the breeding population by [`next_generation`](Self::next_generation).
pub struct GeneticProgramme<P: PaperTrade> {
    trader: P,
    mutator: Mutator,
    config: EvolutionConfig,
    breeding: Population,
    next: Population,
    fitness_sum: f64,
    generation: usize,
    rng: StdRng,
}

impl<P: PaperTrade> GeneticProgramme<P> {
    pub fn new(trader: P, mutator: Mutator, config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Genetic programme: population {}, seed {}",
            config.population_size,
            config.seed
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            breeding: Population::new(config.population_size),
            next: Population::new(config.population_size),
            fitness_sum: 0.0,
            generation: 1,
            trader,
            mutator,
            config,
        })
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn trader(&self) -> &P {
        &self.trader
    }

    pub fn breeding_population(&self) -> &Population {
        &self.breeding
    }

    pub fn next_breeding_population(&self) -> &Population {
        &self.next
    }

    pub fn fitness_sum(&self) -> f64 {
        self.fitness_sum
    }

    /// Produces and scores one candidate, then offers it to the next breeding
    /// population. Candidates outside the depth band, or whose scoring fails
    /// recoverably, are discarded and another is tried.
    pub fn next_individual(&mut self) -> Result<Individual> {
        let (min_depth, max_depth) = (self.config.min_depth, self.config.max_depth);

        for attempt in 1..=self.config.max_attempts {
            let mut candidate = match self.breed_candidate() {
                Ok(candidate) => candidate,
                Err(_) => continue,
            };
            if !candidate.is_valid(min_depth, max_depth) {
                log::debug!("Depth outside {}..={}: {}", min_depth, max_depth, candidate);
                continue;
            }

            let fitness = match candidate.paper_trade(&self.trader) {
                Ok(fitness) => fitness,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Discarding {}: {}", candidate, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let admission = self
                .next
                .compete(candidate.clone(), self.trader.initial_capital());
            log::debug!(
                "Scored {:.2} after {} attempts ({:?}): {}",
                fitness,
                attempt,
                admission,
                candidate
            );
            return Ok(candidate);
        }

        Err(GondolaError::Generation(format!(
            "No candidate could be scored in {} attempts",
            self.config.max_attempts
        )))
    }

    /// Random individuals until there is a breeding population, bred ones
    /// after.
    fn breed_candidate(&mut self) -> Result<Individual> {
        let mother_value = self.rng.gen::<f64>() * self.fitness_sum;
        let father_value = self.rng.gen::<f64>() * self.fitness_sum;

        match (self.breeding.select(mother_value), self.breeding.select(father_value)) {
            (Some(mother), Some(father)) => {
                Individual::breed(mother, father, &self.mutator, &self.config, &mut self.rng)
            }
            _ => Ok(Individual::random(&self.mutator, &mut self.rng)),
        }
    }

    /// Makes the survivors so far the parents of the next generation.
    pub fn next_generation(&mut self) {
        self.breeding = self.next.clone();
        self.fitness_sum = self.breeding.fitness_sum();
        self.generation += 1;

        match self.breeding.best() {
            Some(best) => log::info!(
                "Generation {}: {} breeders, best {:.2} ({})",
                self.generation,
                self.breeding.len(),
                best.fitness().unwrap_or_default(),
                best
            ),
            None => log::info!("Generation {}: no profitable individuals yet", self.generation),
        }
    }

    /// Parent for `value` in `[0, fitness_sum)`, see [`Population::select`].
    pub fn breeding_individual(&self, value: f64) -> Option<&Individual> {
        self.breeding.select(value)
    }

    /// Scores `candidates` individuals in each of `generations` generations.
    pub fn run(
        &mut self,
        generations: usize,
        candidates: usize,
        callback: &mut dyn ProgressCallback,
    ) -> Result<()> {
        for _ in 0..generations {
            let generation = self.generation;
            callback.on_generation_start(generation);

            for candidate in 1..=candidates {
                self.next_individual()?;
                callback.on_candidate_scored(candidate, candidates);
            }

            self.next_generation();
            let best = self
                .breeding
                .best()
                .and_then(Individual::fitness)
                .unwrap_or_else(|| self.trader.initial_capital());
            callback.on_generation_complete(generation, best, self.breeding.len());
        }
        Ok(())
    }

    /// Retained individuals, fittest first.
    pub fn export(&self) -> Vec<ExportedRule> {
        self.next
            .iter()
            .map(|(fitness, individual)| ExportedRule {
                buy_rule: individual.buy_rule().to_string(),
                sell_rule: individual.sell_rule().to_string(),
                fitness,
                breed_type: individual.breed_type(),
            })
            .collect()
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    pub fn save_json<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        std::fs::write(path, self.export_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MutatorConfig;
    use crate::gondola::{Expression, Variables};

    /// Fails every paper trade with a freshly built error.
    struct FailingTrader(fn() -> GondolaError);

    impl PaperTrade for FailingTrader {
        fn paper_trade(&self, _buy: &Expression, _sell: &Expression) -> Result<f64> {
            Err((self.0)())
        }

        fn initial_capital(&self) -> f64 {
            100.0
        }
    }

    /// Rewards larger rules: small ones lose money.
    struct SizeTrader;

    impl PaperTrade for SizeTrader {
        fn paper_trade(&self, buy: &Expression, sell: &Expression) -> Result<f64> {
            Ok(50.0 + 5.0 * (buy.size() + sell.size()) as f64)
        }

        fn initial_capital(&self) -> f64 {
            100.0
        }
    }

    fn programme<P: PaperTrade>(trader: P, config: EvolutionConfig) -> GeneticProgramme<P> {
        let context = Variables::trading_context();
        let mutator = Mutator::new(MutatorConfig::default(), &context, Vec::new()).unwrap();
        GeneticProgramme::new(trader, mutator, config).unwrap()
    }

    #[test]
    fn test_attempts_exhausted() {
        let config = EvolutionConfig {
            max_attempts: 50,
            ..Default::default()
        };
        let mut gp = programme(
            FailingTrader(|| GondolaError::Evaluation("bad window".to_string())),
            config,
        );
        let err = gp.next_individual().unwrap_err();
        assert!(matches!(err, GondolaError::Generation(_)));
        assert!(gp.next_breeding_population().is_empty());
    }

    #[test]
    fn test_unrecoverable_error_propagates() {
        let mut gp = programme(
            FailingTrader(|| GondolaError::DataLoading("gone".to_string())),
            EvolutionConfig::default(),
        );
        assert!(matches!(gp.next_individual(), Err(GondolaError::DataLoading(_))));
    }

    #[test]
    fn test_generations_advance_and_bound_holds() {
        let config = EvolutionConfig {
            population_size: 10,
            ..Default::default()
        };
        let mut gp = programme(SizeTrader, config);
        for _ in 0..3 {
            for _ in 0..40 {
                let individual = gp.next_individual().unwrap();
                assert!(individual.fitness().is_some());
                assert!(gp.next_breeding_population().len() <= 10);
            }
            gp.next_generation();
        }
        assert_eq!(gp.generation(), 4);
        assert_eq!(gp.fitness_sum(), gp.breeding_population().fitness_sum());
        for (fitness, _) in gp.next_breeding_population().iter() {
            assert!(fitness > 100.0);
        }
    }

    #[test]
    fn test_export_json_lists_fittest_first() {
        let mut gp = programme(SizeTrader, EvolutionConfig::default());
        for _ in 0..30 {
            gp.next_individual().unwrap();
        }
        let exported: Vec<ExportedRule> = serde_json::from_str(&gp.export_json().unwrap()).unwrap();
        assert_eq!(exported.len(), gp.next_breeding_population().len());
        assert!(exported.windows(2).all(|pair| pair[0].fitness > pair[1].fitness));
    }
}
