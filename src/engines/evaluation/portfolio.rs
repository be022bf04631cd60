use crate::types::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub struct Position {
    pub entry_day: i64,
    pub entry_price: f64,
    pub shares: f64,
    /// Most recent close seen while holding, used for valuation
    pub last_price: f64,
}

impl Position {
    pub fn value(&self) -> f64 {
        self.shares * self.last_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub entry_day: i64,
    pub exit_day: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub profit: f64,
    pub fees: f64,
}

/// Long-only cash account holding up to `slots` stocks at a time.
pub struct Portfolio {
    pub initial_capital: f64,
    pub cash: f64,
    pub slots: usize,
    pub trade_cost: f64,
    pub positions: BTreeMap<Symbol, Position>,
    pub trades: Vec<Trade>,
    pub transactions: usize,

    // Drawdown tracking
    pub peak_equity: f64,
    pub max_drawdown: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64, slots: usize, trade_cost: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            slots,
            trade_cost,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            transactions: 0,
            peak_equity: initial_capital,
            max_drawdown: 0.0,
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.positions.len() < self.slots
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Buys with an equal share of the cash left for the free slots. Returns
    /// false when there is no slot or the share would not cover the trade
    /// cost.
    pub fn open_position(&mut self, symbol: &Symbol, day: i64, price: f64) -> bool {
        if !self.has_free_slot() || price <= 0.0 || self.positions.contains_key(symbol) {
            return false;
        }
        let free_slots = (self.slots - self.positions.len()) as f64;
        let allocation = self.cash / free_slots;
        if allocation <= self.trade_cost {
            return false;
        }

        let shares = (allocation - self.trade_cost) / price;
        self.cash -= shares * price + self.trade_cost;
        self.transactions += 1;
        self.positions.insert(
            symbol.clone(),
            Position {
                entry_day: day,
                entry_price: price,
                shares,
                last_price: price,
            },
        );
        true
    }

    /// Sells the whole holding and returns the realised profit after fees.
    pub fn close_position(&mut self, symbol: &Symbol, day: i64, price: f64) -> Option<f64> {
        let position = self.positions.remove(symbol)?;
        let fees = 2.0 * self.trade_cost;
        let profit = (price - position.entry_price) * position.shares - fees;

        self.cash += price * position.shares - self.trade_cost;
        self.transactions += 1;
        self.trades.push(Trade {
            symbol: symbol.clone(),
            entry_day: position.entry_day,
            exit_day: day,
            entry_price: position.entry_price,
            exit_price: price,
            shares: position.shares,
            profit,
            fees,
        });
        Some(profit)
    }

    pub fn update_price(&mut self, symbol: &Symbol, price: f64) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.last_price = price;
        }
    }

    pub fn holdings_value(&self) -> f64 {
        self.positions.values().map(Position::value).sum()
    }

    /// Cash plus holdings at their most recent price.
    pub fn total_value(&self) -> f64 {
        self.cash + self.holdings_value()
    }

    /// Updates the drawdown from the end-of-day value.
    pub fn mark_to_market(&mut self) {
        let equity = self.total_value();
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }
}
