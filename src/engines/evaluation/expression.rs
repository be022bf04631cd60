use crate::{
    data::{quote_or_zero, window_pairs, window_samples, QuoteSource},
    error::{GondolaError, Result},
    functions::indicators::{correlation, indicator},
    gondola::{BinaryOp, CalendarField, Expression, UnaryOp, Variables, WindowStat},
    types::{from_bool, is_true, QuoteKind, Symbol, Type, FALSE, TRUE},
};
use chrono::Datelike;

impl Expression {
    /// Reduces the tree to a number for `symbol` on trading day `day`.
    ///
    /// Booleans come back as [`TRUE`] or [`FALSE`]. Missing quotes never
    /// fail: a single point reads as zero and windows shrink. Invalid runtime
    /// parameters fail with `GondolaError::Evaluation`.
    pub fn evaluate(
        &self,
        variables: &Variables,
        quotes: &dyn QuoteSource,
        symbol: &Symbol,
        day: i64,
    ) -> Result<f64> {
        self.evaluate_typed(variables, quotes, symbol, day)
            .map(|evaluated| evaluated.value)
    }

    fn evaluate_typed(
        &self,
        variables: &Variables,
        quotes: &dyn QuoteSource,
        symbol: &Symbol,
        day: i64,
    ) -> Result<Evaluated> {
        let eval = |expr: &Expression| expr.evaluate_typed(variables, quotes, symbol, day);

        match self {
            Expression::Integer(value) => Ok(Evaluated::integer(*value as f64)),
            Expression::Float(value) => Ok(Evaluated::float(*value)),
            Expression::Boolean(value) => Ok(Evaluated::float(from_bool(*value))),
            Expression::Quote(kind) => {
                Ok(Evaluated::float(quote_or_zero(quotes, symbol, *kind, day, 0)))
            }
            Expression::Variable { name, ty } => {
                let value = variables.value(name).ok_or_else(|| {
                    GondolaError::Evaluation(format!("Variable {} is not bound", name))
                })?;
                Ok(Evaluated {
                    value,
                    integer: *ty == Type::Integer,
                })
            }
            Expression::Calendar(field) => {
                calendar_value(*field, quotes, day).map(Evaluated::integer)
            }
            Expression::Unary { op, args } => {
                let arg = eval(&args[0])?;
                match op {
                    UnaryOp::Not => Ok(Evaluated::float(from_bool(!is_true(arg.value)))),
                    UnaryOp::Negate => Ok(Evaluated { value: -arg.value, ..arg }),
                    UnaryOp::Abs => Ok(Evaluated { value: arg.value.abs(), ..arg }),
                    UnaryOp::Sqrt if arg.value < 0.0 => Err(GondolaError::Evaluation(format!(
                        "Square root of negative value {} in {}",
                        arg.value, self
                    ))),
                    UnaryOp::Sqrt => Ok(Evaluated::float(arg.value.sqrt())),
                }
            }
            Expression::Binary { op, args } => {
                let [left, right] = &**args;
                match op {
                    BinaryOp::And => {
                        if !is_true(eval(left)?.value) {
                            return Ok(Evaluated::float(FALSE));
                        }
                        Ok(Evaluated::float(from_bool(is_true(eval(right)?.value))))
                    }
                    BinaryOp::Or => {
                        if is_true(eval(left)?.value) {
                            return Ok(Evaluated::float(TRUE));
                        }
                        Ok(Evaluated::float(from_bool(is_true(eval(right)?.value))))
                    }
                    _ => {
                        let (a, b) = (eval(left)?, eval(right)?);
                        let integer = a.integer && b.integer;
                        let value = arithmetic_or_compare(*op, a.value, b.value, integer)
                            .map_err(|e| match e {
                                GondolaError::Evaluation(msg) => {
                                    GondolaError::Evaluation(format!("{} in {}", msg, self))
                                }
                                other => other,
                            })?;
                        Ok(Evaluated {
                            value,
                            integer: integer && op.is_arithmetic(),
                        })
                    }
                }
            }
            Expression::Lag { args } => {
                let [quote, offset] = &**args;
                let kind = quote_kind(quote)?;
                let offset = offset_value(eval(offset)?.value)?;
                let value = quote_or_zero(quotes, symbol, kind, day, offset);
                Ok(Evaluated {
                    value,
                    integer: kind.value_type().dequote() == Type::Integer,
                })
            }
            Expression::Window { stat, args } => {
                let [quote, period, offset] = &**args;
                let kind = quote_kind(quote)?;
                let period = period_value(eval(period)?.value)?;
                let offset = offset_value(eval(offset)?.value)?;

                let mut first = window_start(period, offset);
                if stat.needs_previous_day() {
                    first = first.saturating_sub(1);
                }
                let samples = window_samples(quotes, symbol, kind, day, first, offset);
                let value = indicator(*stat, period as usize).calculate(&samples);
                if integer_result(*stat, kind) {
                    Ok(Evaluated::integer(value.trunc()))
                } else {
                    Ok(Evaluated::float(value))
                }
            }
            Expression::Correlation { partner, args } => {
                let [quote, period, offset] = &**args;
                let kind = quote_kind(quote)?;
                let partner = Symbol::parse(partner).map_err(|e| {
                    GondolaError::Evaluation(format!("Correlation partner: {}", e))
                })?;
                if !quotes.contains(&partner) {
                    return Err(GondolaError::Evaluation(format!(
                        "Correlation partner {} has no quotes",
                        partner
                    )));
                }
                let period = period_value(eval(period)?.value)?;
                let offset = offset_value(eval(offset)?.value)?;
                let first = window_start(period, offset);
                let pairs = window_pairs(quotes, symbol, &partner, kind, day, first, offset);
                Ok(Evaluated::float(correlation(&pairs)))
            }
            // Both branches share one type, so the taken branch decides it.
            Expression::If { args } => {
                let [condition, then, otherwise] = &**args;
                if is_true(eval(condition)?.value) {
                    eval(then)
                } else {
                    eval(otherwise)
                }
            }
        }
    }
}

/// Value of a node and whether its type is integer.
#[derive(Debug, Clone, Copy)]
struct Evaluated {
    value: f64,
    integer: bool,
}

impl Evaluated {
    fn integer(value: f64) -> Self {
        Self {
            value,
            integer: true,
        }
    }

    fn float(value: f64) -> Self {
        Self {
            value,
            integer: false,
        }
    }
}

/// Applies an arithmetic or comparison operator. Division truncates when
/// both operands are integer-typed.
fn arithmetic_or_compare(op: BinaryOp, a: f64, b: f64, integer: bool) -> Result<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Subtract => Ok(a - b),
        BinaryOp::Multiply => Ok(a * b),
        BinaryOp::Divide => {
            if b == 0.0 {
                return Err(GondolaError::Evaluation("Division by zero".to_string()));
            }
            let quotient = a / b;
            Ok(if integer { quotient.trunc() } else { quotient })
        }
        BinaryOp::LessThan => Ok(from_bool(a < b)),
        BinaryOp::GreaterThan => Ok(from_bool(a > b)),
        BinaryOp::LessEqual => Ok(from_bool(a <= b)),
        BinaryOp::GreaterEqual => Ok(from_bool(a >= b)),
        BinaryOp::Equal => Ok(from_bool(a == b)),
        BinaryOp::NotEqual => Ok(from_bool(a != b)),
        BinaryOp::And => Ok(from_bool(is_true(a) && is_true(b))),
        BinaryOp::Or => Ok(from_bool(is_true(a) || is_true(b))),
    }
}

/// Oldest offset of a window of `period` days ending at `offset`. Periods
/// longer than the data saturate instead of overflowing.
fn window_start(period: i64, offset: i64) -> i64 {
    offset.saturating_sub(period).saturating_add(1)
}

fn integer_result(stat: WindowStat, kind: QuoteKind) -> bool {
    stat.follows_quote() && kind.value_type() == Type::IntegerQuote
}

fn quote_kind(expr: &Expression) -> Result<QuoteKind> {
    match expr {
        Expression::Quote(kind) => Ok(*kind),
        other => Err(GondolaError::Evaluation(format!(
            "Expected a quote, found {}",
            other
        ))),
    }
}

fn period_value(value: f64) -> Result<i64> {
    let period = value.trunc() as i64;
    if period <= 0 {
        return Err(GondolaError::Evaluation(format!(
            "Period must be positive, got {}",
            period
        )));
    }
    Ok(period)
}

/// Offsets look back from the reference day; a positive one would read the
/// future.
fn offset_value(value: f64) -> Result<i64> {
    let offset = value.trunc() as i64;
    if offset > 0 {
        return Err(GondolaError::Evaluation(format!(
            "Offset {} looks ahead of the reference day",
            offset
        )));
    }
    Ok(offset)
}

fn calendar_value(field: CalendarField, quotes: &dyn QuoteSource, day: i64) -> Result<f64> {
    let date = quotes
        .date(day)
        .ok_or_else(|| GondolaError::Evaluation(format!("No calendar date for day {}", day)))?;
    let value = match field {
        CalendarField::DayOfWeek => date.weekday().number_from_sunday() as f64,
        CalendarField::DayOfMonth => date.day() as f64,
        CalendarField::DayOfYear => date.ordinal() as f64,
        CalendarField::Month => date.month() as f64,
        CalendarField::Year => date.year() as f64,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Quote, QuoteBundle};
    use chrono::NaiveDate;

    fn symbol(text: &str) -> Symbol {
        Symbol::parse(text).unwrap()
    }

    /// Ten trading days from Monday 2024-01-01; BHP closes at 10, 11, ... and
    /// skips day 7; CBA closes at 100, 98, ...
    fn quotes() -> QuoteBundle {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut records = Vec::new();
        for i in 0..10 {
            let date = start + chrono::Duration::days(i);
            records.push((symbol("BHP"), date, Quote::flat(10.0 + i as f64, 1000 + i)));
            records.push((symbol("CBA"), date, Quote::flat(100.0 - 2.0 * i as f64, 50)));
        }
        let mut bundle = QuoteBundle::from_records(records).unwrap();
        bundle.remove(&symbol("BHP"), 7);
        bundle
    }

    fn variables() -> Variables {
        let mut variables = Variables::trading_context();
        variables.add_with_value("x", Type::Integer, false, 7.0).unwrap();
        variables.add_with_value("f", Type::Float, false, 2.5).unwrap();
        variables.add("p", Type::Boolean, true).unwrap();
        variables
    }

    fn eval_at(text: &str, day: i64) -> Result<f64> {
        let variables = variables();
        let expr = Expression::parse(text, &variables).unwrap();
        expr.evaluate(&variables, &quotes(), &symbol("BHP"), day)
    }

    fn eval(text: &str) -> Result<f64> {
        eval_at(text, 9)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("x*2+1").unwrap(), 15.0);
        assert_eq!(eval("f*2").unwrap(), 5.0);
        assert_eq!(eval("-x").unwrap(), -7.0);
        assert_eq!(eval("abs(3-x)").unwrap(), 4.0);
        assert_eq!(eval("sqrt(16)").unwrap(), 4.0);
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(eval("x/2").unwrap(), 3.0);
        assert_eq!(eval("-x/2").unwrap(), -3.0);
        assert_eq!(eval("f/2").unwrap(), 1.25);
        assert_eq!(eval("x/2.0").unwrap(), 3.5);
    }

    #[test]
    fn test_integer_division_through_typed_operands() {
        assert_eq!(eval("(if(x>3) {x} else {1})/2").unwrap(), 3.0);
        assert_eq!(eval("(if(x>3) {f} else {1.0})/2").unwrap(), 1.25);
        assert_eq!(eval("abs(-x)/2").unwrap(), 3.0);
        assert_eq!(eval("sqrt(49)/2").unwrap(), 3.5);
        assert_eq!(eval("lag(volume, 0)/2").unwrap(), 504.0);
        assert_eq!(eval_at("dayofmonth()/2", 2).unwrap(), 1.0);
    }

    #[test]
    fn test_booleans_are_sentinels() {
        assert_eq!(eval("x>3").unwrap(), TRUE);
        assert_eq!(eval("x<3").unwrap(), FALSE);
        assert_eq!(eval("not(x<3)").unwrap(), TRUE);
        assert_eq!(eval("if(x>3) {1} else {2}").unwrap(), 1.0);
    }

    #[test]
    fn test_logic_short_circuits() {
        // The right-hand side would fail with a division by zero.
        assert_eq!(eval("x<3 and 1/0>0").unwrap(), FALSE);
        assert_eq!(eval("x>3 or 1/0>0").unwrap(), TRUE);
        assert!(eval("x>3 and 1/0>0").is_err());
    }

    #[test]
    fn test_conditional_evaluates_chosen_branch_only() {
        assert_eq!(eval("if(x>3) {1} else {1/0}").unwrap(), 1.0);
    }

    #[test]
    fn test_runtime_errors() {
        assert!(matches!(eval("x/0"), Err(GondolaError::Evaluation(_))));
        assert!(matches!(eval("sqrt(-1.0)"), Err(GondolaError::Evaluation(_))));
        assert!(matches!(eval("avg(close, 0, 0)"), Err(GondolaError::Evaluation(_))));
        assert!(matches!(eval("avg(close, 5, 1)"), Err(GondolaError::Evaluation(_))));
        assert!(matches!(eval("lag(close, 2)"), Err(GondolaError::Evaluation(_))));
        for text in ["corr(close, \"WBC\", 5, 0)", "corr(close, \"not a symbol\", 5, 0)"] {
            assert!(matches!(eval(text), Err(GondolaError::Evaluation(_))));
        }
    }

    #[test]
    fn test_unbound_variable() {
        let variables = variables();
        let expr = Expression::variable("missing", Type::Integer);
        let err = expr.evaluate(&variables, &quotes(), &symbol("BHP"), 0).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_single_point_missing_reads_zero() {
        assert_eq!(eval_at("lag(close, 0)", 7).unwrap(), 0.0);
        assert_eq!(eval("lag(close, -2)").unwrap(), 0.0);
        assert_eq!(eval("lag(close, -1)").unwrap(), 18.0);
        assert_eq!(eval_at("lag(close, -1)", 0).unwrap(), 0.0);
    }

    #[test]
    fn test_window_excludes_missing_day() {
        // Days 5..=9 without day 7: 15, 16, 18, 19
        assert_eq!(eval("avg(close, 5, 0)").unwrap(), 17.0);
        assert_eq!(eval("sum(close, 5, 0)").unwrap(), 68.0);
        assert_eq!(eval("max(close, 5, -1)").unwrap(), 18.0);
        assert_eq!(eval("min(close, 5, -1)").unwrap(), 14.0);
    }

    #[test]
    fn test_window_of_volume_is_integer() {
        // Days 8 and 9: 1008, 1009
        assert_eq!(eval("avg(volume, 2, 0)").unwrap(), 1008.0);
    }

    #[test]
    fn test_huge_period_clips_to_data() {
        // Days 0..=4: 10 to 14
        assert_eq!(eval("avg(close, 9223372036854775807, -5)").unwrap(), 12.0);
        assert_eq!(eval("avg(close, 9223372036854775807, -5)>1.0").unwrap(), TRUE);
        assert_eq!(eval("momentum(close, 9223372036854775807, 0)").unwrap(), 9.0);
        let value = eval("corr(close, \"CBA\", 9223372036854775807, 0)").unwrap();
        assert!((value + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_before_first_day_is_neutral() {
        assert_eq!(eval_at("avg(close, 5, -3)", 1).unwrap(), 0.0);
        assert_eq!(eval_at("rsi(close, 5, -3)", 1).unwrap(), 50.0);
        assert_eq!(eval_at("avg(close, 5, -1)", 1).unwrap(), 10.0);
    }

    #[test]
    fn test_momentum_spans_period_changes() {
        // Days 6..=9 without day 7: 16 to 19
        assert_eq!(eval("momentum(close, 3, 0)").unwrap(), 3.0);
        assert_eq!(eval("rsi(close, 3, 0)").unwrap(), 100.0);
    }

    #[test]
    fn test_correlation_with_partner() {
        let value = eval("corr(close, \"cba\", 5, 0)").unwrap();
        assert!((value + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_calendar_terminals() {
        // Day 2 is Wednesday 2024-01-03.
        assert_eq!(eval_at("dayofweek()", 2).unwrap(), 4.0);
        assert_eq!(eval_at("dayofmonth()", 2).unwrap(), 3.0);
        assert_eq!(eval_at("dayofyear()", 2).unwrap(), 3.0);
        assert_eq!(eval_at("month()", 2).unwrap(), 1.0);
        assert_eq!(eval_at("year()", 2).unwrap(), 2024.0);
        assert!(eval_at("year()", 40).is_err());
    }
}
