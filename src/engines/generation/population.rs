use super::individual::Individual;
use super::operators::roulette_walk;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Population key with a total order over `f64`.
#[derive(Debug, Clone, Copy)]
pub struct Fitness(pub f64);

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fitness {}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// What happened to a candidate offered to a population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Did not beat the initial capital
    Loss,
    /// Took a free place
    Inserted,
    /// Displaced an equal-fitness but larger individual, or the weakest
    Replaced,
    /// Not fit enough, or an equal-fitness individual is no larger
    Rejected,
}

/// Individuals ordered by fitness, at most `capacity` of them, with one
/// individual per distinct fitness value.
#[derive(Debug, Clone)]
pub struct Population {
    members: BTreeMap<Fitness, Individual>,
    capacity: usize,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: BTreeMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offers a scored individual. Anything at or below `initial_capital`
    /// is a loss and never admitted.
    pub fn compete(&mut self, individual: Individual, initial_capital: f64) -> Admission {
        let Some(value) = individual.fitness() else {
            return Admission::Rejected;
        };
        if value <= initial_capital {
            return Admission::Loss;
        }
        let key = Fitness(value);

        // Equal fitness almost always means the same trades
        if let Some(existing) = self.members.get(&key) {
            if individual.size() < existing.size() {
                self.members.insert(key, individual);
                return Admission::Replaced;
            }
            return Admission::Rejected;
        }

        if self.members.len() < self.capacity {
            self.members.insert(key, individual);
            return Admission::Inserted;
        }

        match self.members.keys().next().copied() {
            Some(weakest) if key > weakest => {
                self.members.remove(&weakest);
                self.members.insert(key, individual);
                Admission::Replaced
            }
            _ => Admission::Rejected,
        }
    }

    pub fn fitness_sum(&self) -> f64 {
        self.members.keys().map(|fitness| fitness.0).sum()
    }

    pub fn best(&self) -> Option<&Individual> {
        self.members.values().next_back()
    }

    pub fn weakest(&self) -> Option<&Individual> {
        self.members.values().next()
    }

    /// Fittest first.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Individual)> {
        self.members.iter().rev().map(|(fitness, individual)| (fitness.0, individual))
    }

    /// Fitness-proportional pick: `value` is drawn from `[0, fitness_sum)`.
    /// Falls back to the fittest when rounding leaves the walk short.
    pub fn select(&self, value: f64) -> Option<&Individual> {
        roulette_walk(self.iter(), value)
    }
}
