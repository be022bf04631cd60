use crate::error::{GondolaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric value the evaluator uses for a true boolean.
pub const TRUE: f64 = 1.0;
/// Numeric value the evaluator uses for a false boolean.
pub const FALSE: f64 = 0.0;
/// Any value at or above this level reads as true.
pub const TRUE_LEVEL: f64 = 0.1;

pub fn is_true(value: f64) -> bool {
    value >= TRUE_LEVEL
}

pub fn from_bool(value: bool) -> f64 {
    if value {
        TRUE
    } else {
        FALSE
    }
}

/// Result kind of a Gondola expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Boolean,
    Integer,
    Float,
    IntegerQuote,
    FloatQuote,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    pub fn is_quote(self) -> bool {
        matches!(self, Type::IntegerQuote | Type::FloatQuote)
    }

    /// Value type produced by aggregating a quote of this type.
    pub fn dequote(self) -> Type {
        match self {
            Type::IntegerQuote => Type::Integer,
            Type::FloatQuote => Type::Float,
            other => other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Boolean => "boolean",
            Type::Integer => "integer",
            Type::Float => "float",
            Type::IntegerQuote => "integer quote",
            Type::FloatQuote => "float quote",
        };
        f.write_str(name)
    }
}

/// One field of a daily OHLCV quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuoteKind {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl QuoteKind {
    pub const ALL: [QuoteKind; 5] = [
        QuoteKind::Open,
        QuoteKind::High,
        QuoteKind::Low,
        QuoteKind::Close,
        QuoteKind::Volume,
    ];

    pub const PRICES: [QuoteKind; 4] = [
        QuoteKind::Open,
        QuoteKind::High,
        QuoteKind::Low,
        QuoteKind::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    pub fn value_type(&self) -> Type {
        match self {
            Self::Volume => Type::IntegerQuote,
            _ => Type::FloatQuote,
        }
    }
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, upper-case stock ticker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub const MAXIMUM_LENGTH: usize = 12;

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.len() > Self::MAXIMUM_LENGTH {
            return Err(GondolaError::SymbolFormat(format!(
                "'{}' must be 1 to {} characters",
                text,
                Self::MAXIMUM_LENGTH
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(GondolaError::SymbolFormat(format!(
                "'{}' contains characters other than letters, digits, '.' or '-'",
                text
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_is_normalised() {
        let symbol = Symbol::parse(" cba ").unwrap();
        assert_eq!(symbol.as_str(), "CBA");
    }

    #[test]
    fn test_malformed_symbols_rejected() {
        assert!(Symbol::parse("").is_err());
        assert!(Symbol::parse("A B").is_err());
        assert!(Symbol::parse("WAYTOOLONGSYMBOL").is_err());
    }

    #[test]
    fn test_volume_is_integer_quote() {
        assert_eq!(QuoteKind::Volume.value_type(), Type::IntegerQuote);
        assert_eq!(QuoteKind::Close.value_type(), Type::FloatQuote);
        assert_eq!(Type::FloatQuote.dequote(), Type::Float);
    }
}
