use super::expression::{BinaryOp, Expression, UnaryOp};
use std::fmt;

/// Precedence of a node when it appears as an operand. Atoms and function
/// calls bind tightest.
fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Binary { op, .. } => op.precedence(),
        Expression::Unary {
            op: UnaryOp::Negate,
            ..
        } => 6,
        _ => 7,
    }
}

fn is_negative(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Unary {
            op: UnaryOp::Negate,
            ..
        }
    ) || expr.literal_value().map_or(false, |value| value < 0.0)
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expression, parenthesise: bool) -> fmt::Result {
    if parenthesise {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Floats always print with a decimal point or an exponent so the text reads
/// back as a float.
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    write!(f, "{:?}", value)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::Float(value) => write_float(f, *value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Quote(kind) => write!(f, "{}", kind),
            Expression::Variable { name, .. } => f.write_str(name),
            Expression::Calendar(field) => write!(f, "{}()", field.name()),
            Expression::Unary { op, args } => {
                let [arg] = &**args;
                match op {
                    UnaryOp::Not => write!(f, "not({})", arg),
                    UnaryOp::Abs => write!(f, "abs({})", arg),
                    UnaryOp::Sqrt => write!(f, "sqrt({})", arg),
                    UnaryOp::Negate => {
                        f.write_str("-")?;
                        write_operand(f, arg, precedence(arg) < 7 || is_negative(arg))
                    }
                }
            }
            Expression::Binary { op, args } => {
                let [left, right] = &**args;
                let own = op.precedence();
                // Comparisons do not chain, so an equal-precedence operand on
                // either side needs brackets.
                let left_parens =
                    precedence(left) < own || (op.is_comparison() && precedence(left) == own);
                let right_parens = precedence(right) <= own
                    || (matches!(op, BinaryOp::Add | BinaryOp::Subtract) && is_negative(right));
                write_operand(f, left, left_parens)?;
                if op.is_logic() {
                    write!(f, " {} ", op.symbol())?;
                } else {
                    f.write_str(op.symbol())?;
                }
                write_operand(f, right, right_parens)
            }
            Expression::Lag { args } => {
                let [quote, offset] = &**args;
                write!(f, "lag({}, {})", quote, offset)
            }
            Expression::Window { stat, args } => {
                let [quote, period, offset] = &**args;
                write!(f, "{}({}, {}, {})", stat.name(), quote, period, offset)
            }
            Expression::Correlation { partner, args } => {
                let [quote, period, offset] = &**args;
                write!(f, "corr({}, \"{}\", {}, {})", quote, partner, period, offset)
            }
            Expression::If { args } => {
                let [condition, then, otherwise] = &**args;
                write!(f, "if({}) {{{}}} else {{{}}}", condition, then, otherwise)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::gondola::expression::{BinaryOp, Expression, WindowStat};
    use crate::types::{QuoteKind, Type};

    fn x() -> Expression {
        Expression::variable("x", Type::Integer)
    }

    fn y() -> Expression {
        Expression::variable("y", Type::Integer)
    }

    #[test]
    fn test_window_syntax() {
        let expr = Expression::window(
            WindowStat::Average,
            Expression::Quote(QuoteKind::Close),
            Expression::Integer(5),
            Expression::Integer(-1),
        );
        assert_eq!(expr.to_string(), "avg(close, 5, -1)");
    }

    #[test]
    fn test_comparison_and_logic_spacing() {
        let cmp = Expression::binary(BinaryOp::GreaterThan, x(), y());
        assert_eq!(cmp.to_string(), "x>y");
        let both = Expression::binary(BinaryOp::And, cmp.clone(), cmp);
        assert_eq!(both.to_string(), "x>y and x>y");
    }

    #[test]
    fn test_brackets_follow_precedence() {
        let sum = Expression::binary(BinaryOp::Add, x(), y());
        let product = Expression::binary(BinaryOp::Multiply, sum.clone(), Expression::Integer(2));
        assert_eq!(product.to_string(), "(x+y)*2");
        let nested = Expression::binary(BinaryOp::Subtract, x(), sum);
        assert_eq!(nested.to_string(), "x-(x+y)");
        let left = Expression::binary(
            BinaryOp::Subtract,
            Expression::binary(BinaryOp::Subtract, x(), y()),
            Expression::Integer(1),
        );
        assert_eq!(left.to_string(), "x-y-1");
    }

    #[test]
    fn test_if_syntax() {
        let expr = Expression::if_else(
            Expression::Boolean(true),
            Expression::Integer(1),
            Expression::Integer(2),
        );
        assert_eq!(expr.to_string(), "if(true) {1} else {2}");
    }

    #[test]
    fn test_float_keeps_decimal_point() {
        assert_eq!(Expression::Float(2.0).to_string(), "2.0");
        assert_eq!(Expression::Float(0.25).to_string(), "0.25");
        assert_eq!(Expression::negate(Expression::Integer(-3)).to_string(), "-(-3)");
    }

    #[test]
    fn test_large_whole_float_keeps_exponent() {
        assert_eq!(Expression::Float(1e15).to_string(), "1000000000000000.0");
        assert_eq!(Expression::Float(1e16).to_string(), "1e16");
        assert_eq!(Expression::Float(1e20).to_string(), "1e20");
    }
}
