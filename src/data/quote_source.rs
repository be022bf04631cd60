use crate::error::Result;
use crate::types::{QuoteKind, Symbol};
use chrono::NaiveDate;
use std::ops::RangeInclusive;

/// Daily quotes addressed by trading-day index.
///
/// A day index counts trading days on a shared calendar; `offset` is added to
/// `day` before the lookup, so `offset = -1` reads the previous trading day.
pub trait QuoteSource {
    /// One value, or `GondolaError::MissingQuote` when the symbol did not
    /// trade on that day or the day is outside the data.
    fn get_quote(&self, symbol: &Symbol, kind: QuoteKind, day: i64, offset: i64) -> Result<f64>;

    /// Calendar date of a trading day.
    fn date(&self, day: i64) -> Option<NaiveDate>;

    /// First and last day index held, inclusive.
    fn day_range(&self) -> (i64, i64);

    fn symbols(&self) -> Vec<Symbol>;

    fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols().iter().any(|known| known == symbol)
    }
}

/// Single-point lookup: a missing quote reads as zero.
pub fn quote_or_zero(
    source: &dyn QuoteSource,
    symbol: &Symbol,
    kind: QuoteKind,
    day: i64,
    offset: i64,
) -> f64 {
    source.get_quote(symbol, kind, day, offset).unwrap_or(0.0)
}

/// Day indices `day + first ..= day + last`, clipped to the days the source
/// holds.
fn window_days(source: &dyn QuoteSource, day: i64, first: i64, last: i64) -> RangeInclusive<i64> {
    let (first_day, last_day) = source.day_range();
    let start = day.saturating_add(first).max(first_day);
    let end = day.saturating_add(last).min(last_day);
    start..=end
}

/// Present samples for the offsets `first ..= last`, oldest first. Missing
/// days are skipped, so the result may be shorter than the window.
pub fn window_samples(
    source: &dyn QuoteSource,
    symbol: &Symbol,
    kind: QuoteKind,
    day: i64,
    first: i64,
    last: i64,
) -> Vec<f64> {
    window_days(source, day, first, last)
        .filter_map(|absolute| source.get_quote(symbol, kind, absolute, 0).ok())
        .collect()
}

/// Paired samples of two symbols over the offsets `first ..= last`, kept only
/// on days where both have a quote.
pub fn window_pairs(
    source: &dyn QuoteSource,
    symbol: &Symbol,
    partner: &Symbol,
    kind: QuoteKind,
    day: i64,
    first: i64,
    last: i64,
) -> Vec<(f64, f64)> {
    window_days(source, day, first, last)
        .filter_map(|absolute| {
            let own = source.get_quote(symbol, kind, absolute, 0).ok()?;
            let other = source.get_quote(partner, kind, absolute, 0).ok()?;
            Some((own, other))
        })
        .collect()
}
