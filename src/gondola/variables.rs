use crate::error::{GondolaError, Result};
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Days the current stock has been held
pub const HELD: &str = "held";
/// Position of the current stock in the traded symbol list
pub const ORDER: &str = "order";
/// Trading days since the start of the paper trade
pub const DAYS_FROM_START: &str = "daysfromstart";
/// Number of transactions made so far
pub const TRANSACTIONS: &str = "transactions";
/// Cash available
pub const CAPITAL: &str = "capital";
/// Market value of the current stock holding
pub const STOCK_CAPITAL: &str = "stockcapital";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub mutable: bool,
    pub value: f64,
}

/// Ordered set of named inputs available to an expression besides quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    entries: Vec<Variable>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context a paper trade binds while evaluating rules.
    pub fn trading_context() -> Self {
        let mut variables = Self::new();
        for (name, ty) in [
            (HELD, Type::Integer),
            (ORDER, Type::Integer),
            (DAYS_FROM_START, Type::Integer),
            (TRANSACTIONS, Type::Integer),
            (CAPITAL, Type::Float),
            (STOCK_CAPITAL, Type::Float),
        ] {
            variables.entries.push(Variable {
                name: name.to_string(),
                ty,
                mutable: true,
                value: 0.0,
            });
        }
        variables
    }

    pub fn add(&mut self, name: &str, ty: Type, mutable: bool) -> Result<()> {
        self.add_with_value(name, ty, mutable, 0.0)
    }

    pub fn add_with_value(
        &mut self,
        name: &str,
        ty: Type,
        mutable: bool,
        value: f64,
    ) -> Result<()> {
        if self.contains(name) {
            return Err(GondolaError::Configuration(format!(
                "Variable {} already declared",
                name
            )));
        }
        if ty.is_quote() {
            return Err(GondolaError::type_mismatch("a non-quote variable type", ty));
        }
        self.entries.push(Variable {
            name: name.to_string(),
            ty,
            mutable,
            value,
        });
        Ok(())
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let variable = self
            .entries
            .iter_mut()
            .find(|variable| variable.name == name)
            .ok_or_else(|| GondolaError::Evaluation(format!("Unknown variable {}", name)))?;
        if !variable.mutable {
            return Err(GondolaError::Evaluation(format!(
                "Variable {} is constant",
                name
            )));
        }
        variable.value = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries.iter().find(|variable| variable.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|variable| variable.value)
    }

    pub fn type_of(&self, name: &str) -> Option<Type> {
        self.get(name).map(|variable| variable.ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
