use super::traits::ConfigSection;
use crate::error::GondolaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperTradeConfig {
    pub initial_capital: f64,
    /// Number of stocks held at once; cash is split equally between them
    pub num_stocks: usize,
    /// Fixed cost of every buy and every sell
    pub trade_cost: f64,
    /// First trading day index; the start of the data when unset
    pub first_day: Option<i64>,
    /// Last trading day index; the end of the data when unset
    pub last_day: Option<i64>,
}

impl Default for PaperTradeConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            num_stocks: 5,
            trade_cost: 30.0,
            first_day: None,
            last_day: None,
        }
    }
}

impl ConfigSection for PaperTradeConfig {
    fn section_name() -> &'static str {
        "paper_trade"
    }

    fn validate(&self) -> Result<(), GondolaError> {
        if self.initial_capital <= 0.0 {
            return Err(GondolaError::Configuration(
                "Initial capital must be positive".to_string()
            ));
        }
        if self.num_stocks == 0 {
            return Err(GondolaError::Configuration(
                "Number of stocks must be at least 1".to_string()
            ));
        }
        if self.trade_cost < 0.0 {
            return Err(GondolaError::Configuration(
                "Trade cost must not be negative".to_string()
            ));
        }
        if let (Some(first), Some(last)) = (self.first_day, self.last_day) {
            if first > last {
                return Err(GondolaError::Configuration(format!(
                    "First day {} is after last day {}",
                    first, last
                )));
            }
        }
        Ok(())
    }
}
