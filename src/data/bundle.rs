use super::quote_source::QuoteSource;
use crate::error::{GondolaError, Result};
use crate::types::{QuoteKind, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Quote {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Quote with every price equal to `price`.
    pub fn flat(price: f64, volume: i64) -> Self {
        Self::new(price, price, price, price, volume)
    }

    pub fn value(&self, kind: QuoteKind) -> f64 {
        match kind {
            QuoteKind::Open => self.open,
            QuoteKind::High => self.high,
            QuoteKind::Low => self.low,
            QuoteKind::Close => self.close,
            QuoteKind::Volume => self.volume as f64,
        }
    }
}

/// In-memory quotes for several symbols over one shared trading calendar.
///
/// Day `i` is the `i`-th date of the calendar. A symbol that did not trade on
/// a calendar date has no quote for that day.
#[derive(Debug, Clone, Default)]
pub struct QuoteBundle {
    dates: Vec<NaiveDate>,
    series: BTreeMap<Symbol, Vec<Option<Quote>>>,
}

impl QuoteBundle {
    /// Empty bundle over the given calendar. Dates are sorted and
    /// de-duplicated.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            dates: dates.into_iter().collect(),
            series: BTreeMap::new(),
        }
    }

    /// Builds the calendar from the union of all record dates.
    pub fn from_records(
        records: impl IntoIterator<Item = (Symbol, NaiveDate, Quote)>,
    ) -> Result<Self> {
        let records: Vec<_> = records.into_iter().collect();
        let mut bundle = Self::new(records.iter().map(|(_, date, _)| *date));
        for (symbol, date, quote) in records {
            bundle.insert(symbol, date, quote)?;
        }
        Ok(bundle)
    }

    pub fn insert(&mut self, symbol: Symbol, date: NaiveDate, quote: Quote) -> Result<()> {
        let day = self.dates.binary_search(&date).map_err(|_| {
            GondolaError::DataLoading(format!("{} is not on the trading calendar", date))
        })?;
        let length = self.dates.len();
        let series = self
            .series
            .entry(symbol)
            .or_insert_with(|| vec![None; length]);
        if series[day].replace(quote).is_some() {
            log::warn!("duplicate quote on {} replaced", date);
        }
        Ok(())
    }

    /// Removes one symbol's quote for a day, leaving a gap.
    pub fn remove(&mut self, symbol: &Symbol, day: i64) -> Option<Quote> {
        let index = usize::try_from(day).ok()?;
        self.series.get_mut(symbol)?.get_mut(index)?.take()
    }

    pub fn day_of(&self, date: NaiveDate) -> Option<i64> {
        self.dates.binary_search(&date).ok().map(|day| day as i64)
    }

    pub fn num_days(&self) -> usize {
        self.dates.len()
    }

    pub fn num_symbols(&self) -> usize {
        self.series.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn quote(&self, symbol: &Symbol, day: i64) -> Option<&Quote> {
        let index = usize::try_from(day).ok()?;
        self.series.get(symbol)?.get(index)?.as_ref()
    }
}

impl QuoteSource for QuoteBundle {
    fn get_quote(&self, symbol: &Symbol, kind: QuoteKind, day: i64, offset: i64) -> Result<f64> {
        let absolute = day.saturating_add(offset);
        self.quote(symbol, absolute)
            .map(|quote| quote.value(kind))
            .ok_or_else(|| GondolaError::MissingQuote {
                symbol: symbol.to_string(),
                day: absolute,
            })
    }

    fn date(&self, day: i64) -> Option<NaiveDate> {
        let index = usize::try_from(day).ok()?;
        self.dates.get(index).copied()
    }

    fn day_range(&self) -> (i64, i64) {
        (0, self.dates.len() as i64 - 1)
    }

    fn symbols(&self) -> Vec<Symbol> {
        self.series.keys().cloned().collect()
    }

    fn contains(&self, symbol: &Symbol) -> bool {
        self.series.contains_key(symbol)
    }
}
