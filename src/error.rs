use thiserror::Error;

#[derive(Error, Debug)]
pub enum GondolaError {
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("No quote for {symbol} on day {day}")]
    MissingQuote { symbol: String, day: i64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid symbol: {0}")]
    SymbolFormat(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl GondolaError {
    pub fn type_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Failures the genetic programme recovers from by discarding the candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Evaluation(_) | Self::MissingQuote { .. })
    }
}

pub type Result<T> = std::result::Result<T, GondolaError>;
