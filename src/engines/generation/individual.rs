use super::mutator::Mutator;
use super::operators::weighted_choice;
use crate::{
    config::{BreedWeights, EvolutionConfig},
    engines::evaluation::PaperTrade,
    error::{GondolaError, Result},
    gondola::Expression,
    types::Type,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an individual came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreedType {
    /// Supplied or freshly generated rules
    Random,
    /// Copy of one parent, always mutated
    Clone,
    /// Buy rule of one parent, sell rule of the other
    Swap,
    /// Buy rule recombined with the other parent's buy rule
    Recombine,
    /// Recombined buy rule and the other parent's sell rule
    SwapRecombine,
    /// Both rules recombined with the other parent's
    DoubleRecombine,
}

impl BreedType {
    pub fn random<R: Rng + ?Sized>(weights: &BreedWeights, rng: &mut R) -> Self {
        let weights = [
            weights.clone,
            weights.swap,
            weights.recombine,
            weights.swap_recombine,
            weights.double_recombine,
        ];
        match weighted_choice(&weights, rng) {
            Some(0) => Self::Clone,
            Some(1) => Self::Swap,
            Some(2) => Self::Recombine,
            Some(3) => Self::SwapRecombine,
            Some(4) => Self::DoubleRecombine,
            _ => Self::Random,
        }
    }
}

/// A buy rule and a sell rule, both boolean, with the fitness they earned
/// once paper traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    buy_rule: Expression,
    sell_rule: Expression,
    breed_type: BreedType,
    fitness: Option<f64>,
}

impl Individual {
    /// Pairs two supplied rules; both must be boolean.
    pub fn new(buy_rule: Expression, sell_rule: Expression) -> Result<Self> {
        Self::with_breed_type(buy_rule, sell_rule, BreedType::Random)
    }

    fn with_breed_type(
        buy_rule: Expression,
        sell_rule: Expression,
        breed_type: BreedType,
    ) -> Result<Self> {
        for rule in [&buy_rule, &sell_rule] {
            let ty = rule.check_type()?;
            if ty != Type::Boolean {
                return Err(GondolaError::type_mismatch(Type::Boolean, ty));
            }
        }
        Ok(Self {
            buy_rule,
            sell_rule,
            breed_type,
            fitness: None,
        })
    }

    pub fn random<R: Rng + ?Sized>(mutator: &Mutator, rng: &mut R) -> Self {
        Self {
            buy_rule: mutator.create_random(Type::Boolean, 1, rng).simplify(),
            sell_rule: mutator.create_random(Type::Boolean, 1, rng).simplify(),
            breed_type: BreedType::Random,
            fitness: None,
        }
    }

    /// Breeds a new individual from copies of the parents' rules. The
    /// parents are left untouched.
    pub fn breed<R: Rng + ?Sized>(
        mother: &Individual,
        father: &Individual,
        mutator: &Mutator,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let breed_type = BreedType::random(&config.breed_weights, rng);

        let (buy_rule, sell_rule) = match breed_type {
            BreedType::Random => {
                let random = Self::random(mutator, rng);
                (random.buy_rule, random.sell_rule)
            }
            BreedType::Clone => (mother.buy_rule.clone(), mother.sell_rule.clone()),
            BreedType::Swap => (mother.buy_rule.clone(), father.sell_rule.clone()),
            BreedType::Recombine => (
                mutator.recombine(mother.buy_rule.clone(), &father.buy_rule, rng),
                mother.sell_rule.clone(),
            ),
            BreedType::SwapRecombine => (
                mutator.recombine(mother.buy_rule.clone(), &father.buy_rule, rng),
                father.sell_rule.clone(),
            ),
            BreedType::DoubleRecombine => (
                mutator.recombine(mother.buy_rule.clone(), &father.buy_rule, rng),
                mutator.recombine(mother.sell_rule.clone(), &father.sell_rule, rng),
            ),
        };

        // A clone must differ from its parent
        let percent = if breed_type == BreedType::Clone {
            100
        } else {
            config.mutation_percent
        };
        let buy_rule = mutator.mutate(buy_rule, percent, rng).simplify();
        let sell_rule = mutator.mutate(sell_rule, percent, rng).simplify();

        Self::with_breed_type(buy_rule, sell_rule, breed_type).map_err(|e| {
            log::error!("{:?} breeding produced an ill-typed rule: {}", breed_type, e);
            e
        })
    }

    pub fn buy_rule(&self) -> &Expression {
        &self.buy_rule
    }

    pub fn sell_rule(&self) -> &Expression {
        &self.sell_rule
    }

    pub fn breed_type(&self) -> BreedType {
        self.breed_type
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Both rule depths lie within `min_depth..=max_depth`.
    pub fn is_valid(&self, min_depth: usize, max_depth: usize) -> bool {
        [&self.buy_rule, &self.sell_rule]
            .iter()
            .all(|rule| (min_depth..=max_depth).contains(&rule.depth()))
    }

    /// Combined node count of both rules.
    pub fn size(&self) -> usize {
        self.buy_rule.size() + self.sell_rule.size()
    }

    /// Scores the rules and records the result as the fitness.
    pub fn paper_trade<P: PaperTrade + ?Sized>(&mut self, trader: &P) -> Result<f64> {
        let fitness = trader.paper_trade(&self.buy_rule, &self.sell_rule)?;
        self.fitness = Some(fitness);
        Ok(fitness)
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buy: {}  sell: {}", self.buy_rule, self.sell_rule)
    }
}
