use crate::{
    config::{ConfigSection, PaperTradeConfig},
    data::QuoteSource,
    engines::evaluation::Portfolio,
    error::{GondolaError, Result},
    gondola::{variables, Expression, Variables},
    types::{is_true, QuoteKind, Symbol},
};

/// Scores a buy/sell rule pair by simulating it.
pub trait PaperTrade {
    /// Portfolio value at the end of the simulation.
    fn paper_trade(&self, buy_rule: &Expression, sell_rule: &Expression) -> Result<f64>;

    /// Capital the simulation starts with; a result at or below it is a loss.
    fn initial_capital(&self) -> f64;
}

/// Walks the configured day range over every symbol of a quote source.
///
/// Each day, a symbol not held is bought at the close when the buy rule is
/// true and a slot is free; a held symbol is sold at the close when the sell
/// rule is true. Rules are evaluated with the trading context variables bound
/// for that symbol and day.
pub struct SimplePaperTrader<Q: QuoteSource> {
    quotes: Q,
    config: PaperTradeConfig,
    symbols: Vec<Symbol>,
    first_day: i64,
    last_day: i64,
}

impl<Q: QuoteSource> SimplePaperTrader<Q> {
    pub fn new(quotes: Q, config: PaperTradeConfig) -> Result<Self> {
        config.validate()?;
        let (data_first, data_last) = quotes.day_range();
        let first_day = config.first_day.unwrap_or(data_first).max(data_first);
        let last_day = config.last_day.unwrap_or(data_last).min(data_last);
        if first_day > last_day {
            return Err(GondolaError::Configuration(format!(
                "No trading days between {} and {}",
                first_day, last_day
            )));
        }

        let symbols = quotes.symbols();
        log::debug!(
            "Paper trading {} symbols over days {}..={}",
            symbols.len(),
            first_day,
            last_day
        );
        Ok(Self {
            quotes,
            config,
            symbols,
            first_day,
            last_day,
        })
    }

    pub fn quotes(&self) -> &Q {
        &self.quotes
    }

    /// Runs the simulation and hands back the final portfolio.
    pub fn simulate(&self, buy_rule: &Expression, sell_rule: &Expression) -> Result<Portfolio> {
        let mut portfolio = Portfolio::new(
            self.config.initial_capital,
            self.config.num_stocks,
            self.config.trade_cost,
        );
        let mut context = Variables::trading_context();

        for day in self.first_day..=self.last_day {
            for (order, symbol) in self.symbols.iter().enumerate() {
                let close = match self.quotes.get_quote(symbol, QuoteKind::Close, day, 0) {
                    Ok(close) => close,
                    Err(_) => continue,
                };
                portfolio.update_price(symbol, close);

                let held = portfolio
                    .position(symbol)
                    .map(|position| (day - position.entry_day, position.value()));
                if held.is_none() && !portfolio.has_free_slot() {
                    continue;
                }

                let (held_days, stock_capital) = held.unwrap_or((0, 0.0));
                context.set_value(variables::HELD, held_days as f64)?;
                context.set_value(variables::ORDER, order as f64)?;
                context.set_value(variables::DAYS_FROM_START, (day - self.first_day) as f64)?;
                context.set_value(variables::TRANSACTIONS, portfolio.transactions as f64)?;
                context.set_value(variables::CAPITAL, portfolio.cash)?;
                context.set_value(variables::STOCK_CAPITAL, stock_capital)?;

                if held.is_some() {
                    if is_true(sell_rule.evaluate(&context, &self.quotes, symbol, day)?) {
                        portfolio.close_position(symbol, day, close);
                    }
                } else if is_true(buy_rule.evaluate(&context, &self.quotes, symbol, day)?) {
                    portfolio.open_position(symbol, day, close);
                }
            }
            portfolio.mark_to_market();
        }

        Ok(portfolio)
    }
}

impl<Q: QuoteSource> PaperTrade for SimplePaperTrader<Q> {
    fn paper_trade(&self, buy_rule: &Expression, sell_rule: &Expression) -> Result<f64> {
        let portfolio = self.simulate(buy_rule, sell_rule)?;
        Ok(portfolio.total_value())
    }

    fn initial_capital(&self) -> f64 {
        self.config.initial_capital
    }
}
