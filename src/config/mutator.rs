use super::traits::ConfigSection;
use crate::error::GondolaError;
use crate::gondola::variables;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MutatorConfig {
    /// A node at level `l` is a non-terminal with probability
    /// `min(1, branch_factor / l)`
    pub branch_factor: f64,
    /// Deepest level at which non-terminals may still be generated
    pub max_level: usize,
    /// Integer literals are drawn from `-max_integer..=max_integer`
    pub max_integer: i64,
    /// Float literals are drawn from `-max_float..max_float`
    pub max_float: f64,
    /// Window periods are drawn from `1..=max_period`
    pub max_period: i64,
    /// Offsets are drawn from `-max_offset..=0`
    pub max_offset: i64,
    pub allow_calendar: bool,
    /// Context variables generated trees may refer to
    pub variables: Vec<String>,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            branch_factor: 2.0,
            max_level: 6,
            max_integer: 100,
            max_float: 100.0,
            max_period: 50,
            max_offset: 10,
            allow_calendar: true,
            variables: [
                variables::HELD,
                variables::ORDER,
                variables::DAYS_FROM_START,
                variables::TRANSACTIONS,
                variables::CAPITAL,
                variables::STOCK_CAPITAL,
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
        }
    }
}

impl ConfigSection for MutatorConfig {
    fn section_name() -> &'static str {
        "mutator"
    }

    fn validate(&self) -> Result<(), GondolaError> {
        if self.branch_factor <= 0.0 {
            return Err(GondolaError::Configuration(
                "Branch factor must be positive".to_string()
            ));
        }
        if self.max_level < 2 {
            return Err(GondolaError::Configuration(
                "Max level must be at least 2".to_string()
            ));
        }
        if self.max_integer < 1 || self.max_float <= 0.0 {
            return Err(GondolaError::Configuration(
                "Literal ranges must be positive".to_string()
            ));
        }
        if self.max_period < 1 || self.max_offset < 0 {
            return Err(GondolaError::Configuration(
                "Max period must be positive and max offset non-negative".to_string()
            ));
        }
        Ok(())
    }
}
