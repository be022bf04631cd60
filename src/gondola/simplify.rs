use super::expression::{BinaryOp, Expression, UnaryOp};
use crate::types::Type;

impl Expression {
    /// One bottom-up algebraic rewrite pass. Children are simplified first,
    /// then the node's own rules apply, so a second pass changes nothing.
    pub fn simplify(self) -> Expression {
        match self {
            Expression::Unary { op, args } => {
                let [arg] = *args;
                simplify_unary(op, arg.simplify())
            }
            Expression::Binary { op, args } => {
                let [left, right] = *args;
                simplify_binary(op, left.simplify(), right.simplify())
            }
            Expression::Lag { args } => {
                let [quote, offset] = *args;
                Expression::lag(quote, offset.simplify())
            }
            Expression::Window { stat, args } => {
                let [quote, period, offset] = *args;
                Expression::window(stat, quote, period.simplify(), offset.simplify())
            }
            Expression::Correlation { partner, args } => {
                let [quote, period, offset] = *args;
                Expression::correlation(quote, partner, period.simplify(), offset.simplify())
            }
            Expression::If { args } => {
                let [condition, then, otherwise] = *args;
                let (condition, then, otherwise) =
                    (condition.simplify(), then.simplify(), otherwise.simplify());
                match condition {
                    Expression::Boolean(true) => then,
                    Expression::Boolean(false) => otherwise,
                    _ if then == otherwise => then,
                    condition => Expression::if_else(condition, then, otherwise),
                }
            }
            terminal => terminal,
        }
    }
}

/// Literal of the given numeric type.
fn literal(ty: Type, value: f64) -> Expression {
    match ty {
        Type::Integer => Expression::Integer(value as i64),
        _ => Expression::Float(value),
    }
}

fn simplify_unary(op: UnaryOp, arg: Expression) -> Expression {
    match (op, arg) {
        (UnaryOp::Not, Expression::Unary { op: UnaryOp::Not, args }) => {
            let [inner] = *args;
            inner
        }
        (UnaryOp::Not, Expression::Boolean(value)) => Expression::Boolean(!value),
        (UnaryOp::Not, Expression::Binary { op: cmp, args }) if cmp.is_comparison() => {
            match cmp.negated() {
                Some(flipped) => Expression::Binary { op: flipped, args },
                None => Expression::not(Expression::Binary { op: cmp, args }),
            }
        }
        (UnaryOp::Negate, Expression::Unary { op: UnaryOp::Negate, args }) => {
            let [inner] = *args;
            inner
        }
        (UnaryOp::Negate, Expression::Integer(value)) => match value.checked_neg() {
            Some(negated) => Expression::Integer(negated),
            None => Expression::negate(Expression::Integer(value)),
        },
        (UnaryOp::Negate, Expression::Float(value)) => Expression::Float(-value),
        (UnaryOp::Abs, Expression::Integer(value)) => match value.checked_abs() {
            Some(absolute) => Expression::Integer(absolute),
            None => Expression::unary(UnaryOp::Abs, Expression::Integer(value)),
        },
        (UnaryOp::Abs, Expression::Float(value)) => Expression::Float(value.abs()),
        (op, arg) => Expression::unary(op, arg),
    }
}

fn simplify_binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    if let Some(folded) = fold_constants(op, &left, &right) {
        return folded;
    }
    if op.is_logic() {
        return simplify_logic(op, left, right);
    }
    if !op.is_arithmetic() {
        return Expression::binary(op, left, right);
    }

    let (left_ty, right_ty) = match (left.check_type(), right.check_type()) {
        (Ok(left_ty), Ok(right_ty)) => (left_ty, right_ty),
        _ => return Expression::binary(op, left, right),
    };
    let ty = if left_ty == Type::Integer && right_ty == Type::Integer {
        Type::Integer
    } else {
        Type::Float
    };
    // An identity may only drop an operator when the surviving operand
    // already has the node's result type.
    let keeps_left = left_ty == ty;
    let keeps_right = right_ty == ty;

    match op {
        BinaryOp::Multiply => {
            if left.is_zero() || right.is_zero() {
                literal(ty, 0.0)
            } else if left.is_one() && keeps_right {
                right
            } else if right.is_one() && keeps_left {
                left
            } else {
                Expression::binary(op, left, right)
            }
        }
        BinaryOp::Add => {
            if right.is_zero() && keeps_left {
                left
            } else if left.is_zero() && keeps_right {
                right
            } else {
                Expression::binary(op, left, right)
            }
        }
        BinaryOp::Subtract => {
            if right.is_zero() && keeps_left {
                left
            } else if left.is_zero() && keeps_right {
                simplify_unary(UnaryOp::Negate, right)
            } else if left == right {
                literal(ty, 0.0)
            } else {
                Expression::binary(op, left, right)
            }
        }
        BinaryOp::Divide => {
            if right.is_zero() {
                Expression::binary(op, left, right)
            } else if right.is_one() && keeps_left {
                left
            } else if left.is_zero() {
                literal(ty, 0.0)
            } else if left == right {
                literal(ty, 1.0)
            } else {
                Expression::binary(op, left, right)
            }
        }
        _ => Expression::binary(op, left, right),
    }
}

fn simplify_logic(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    let absorbing = op == BinaryOp::Or;
    match (left, right) {
        (Expression::Boolean(value), other) | (other, Expression::Boolean(value)) => {
            if value == absorbing {
                Expression::Boolean(value)
            } else {
                other
            }
        }
        (left, right) if left == right => left,
        (left, right) => Expression::binary(op, left, right),
    }
}

/// Evaluates an operator over two numeric literals. Division by zero and
/// integer overflow are left for the evaluator to report.
fn fold_constants(op: BinaryOp, left: &Expression, right: &Expression) -> Option<Expression> {
    if let (Expression::Integer(a), Expression::Integer(b)) = (left, right) {
        let (a, b) = (*a, *b);
        return match op {
            BinaryOp::Add => a.checked_add(b).map(Expression::Integer),
            BinaryOp::Subtract => a.checked_sub(b).map(Expression::Integer),
            BinaryOp::Multiply => a.checked_mul(b).map(Expression::Integer),
            BinaryOp::Divide => a.checked_div(b).map(Expression::Integer),
            _ if op.is_comparison() => Some(Expression::Boolean(compare(op, a as f64, b as f64))),
            _ => None,
        };
    }

    let (a, b) = (left.literal_value()?, right.literal_value()?);
    if op.is_comparison() {
        // Mixed literal kinds are a type error; leave them for the checker.
        return match (left, right) {
            (Expression::Float(_), Expression::Float(_)) => {
                Some(Expression::Boolean(compare(op, a, b)))
            }
            _ => None,
        };
    }
    match op {
        BinaryOp::Add => Some(Expression::Float(a + b)),
        BinaryOp::Subtract => Some(Expression::Float(a - b)),
        BinaryOp::Multiply => Some(Expression::Float(a * b)),
        BinaryOp::Divide if b != 0.0 => Some(Expression::Float(a / b)),
        _ => None,
    }
}

fn compare(op: BinaryOp, a: f64, b: f64) -> bool {
    match op {
        BinaryOp::LessThan => a < b,
        BinaryOp::GreaterThan => a > b,
        BinaryOp::LessEqual => a <= b,
        BinaryOp::GreaterEqual => a >= b,
        BinaryOp::Equal => a == b,
        BinaryOp::NotEqual => a != b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::gondola::{Expression, Variables};
    use crate::types::Type;

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.add("x", Type::Integer, true).unwrap();
        variables.add("y", Type::Integer, true).unwrap();
        variables.add("f", Type::Float, true).unwrap();
        variables.add("p", Type::Boolean, true).unwrap();
        variables
    }

    fn simplified(text: &str) -> String {
        Expression::parse(text, &variables())
            .unwrap()
            .simplify()
            .to_string()
    }

    #[test]
    fn test_constant_division() {
        assert_eq!(simplified("10/5"), "2");
        assert_eq!(simplified("7/2"), "3");
        assert_eq!(simplified("7.0/2"), "3.5");
    }

    #[test]
    fn test_product_with_zero() {
        assert_eq!(simplified("5*x*0"), "0");
        assert_eq!(simplified("f*0"), "0.0");
    }

    #[test]
    fn test_identities() {
        assert_eq!(simplified("x*1"), "x");
        assert_eq!(simplified("1*x"), "x");
        assert_eq!(simplified("x+0"), "x");
        assert_eq!(simplified("0+x"), "x");
        assert_eq!(simplified("x-0"), "x");
        assert_eq!(simplified("0-x"), "-x");
        assert_eq!(simplified("x/1"), "x");
        assert_eq!(simplified("0/x"), "0");
        assert_eq!(simplified("x-x"), "0");
        assert_eq!(simplified("x/x"), "1");
        assert_eq!(simplified("(x+y)-(y+x)"), "0");
    }

    #[test]
    fn test_identity_keeps_result_type() {
        // x*1.0 is a float, so dropping the operator would change its type.
        assert_eq!(simplified("x*1.0"), "x*1.0");
        assert_eq!(simplified("f*1"), "f");
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        assert_eq!(simplified("1/0"), "1/0");
        assert_eq!(simplified("x/0"), "x/0");
        assert_eq!(simplified("0/0"), "0/0");
    }

    #[test]
    fn test_logic_rules() {
        assert_eq!(simplified("p and true"), "p");
        assert_eq!(simplified("true and p"), "p");
        assert_eq!(simplified("p and false"), "false");
        assert_eq!(simplified("p or true"), "true");
        assert_eq!(simplified("false or p"), "p");
        assert_eq!(simplified("x>y and y<x"), "x>y and y<x");
        assert_eq!(simplified("x>y and x>y"), "x>y");
        assert_eq!(simplified("p or p"), "p");
    }

    #[test]
    fn test_not_rules() {
        assert_eq!(simplified("not(not(p))"), "p");
        assert_eq!(simplified("not(true)"), "false");
        assert_eq!(simplified("not(x>y)"), "x<=y");
        assert_eq!(simplified("not(x==y)"), "x!=y");
        assert_eq!(simplified("not(x<=y)"), "x>y");
    }

    #[test]
    fn test_negation_and_abs_fold() {
        assert_eq!(simplified("-(-x)"), "x");
        assert_eq!(simplified("abs(-4)"), "4");
        assert_eq!(simplified("-(2.5)"), "-2.5");
    }

    #[test]
    fn test_comparison_of_literals_folds() {
        assert_eq!(simplified("3>2"), "true");
        assert_eq!(simplified("1.5==2.5"), "false");
    }

    #[test]
    fn test_conditional_rules() {
        assert_eq!(simplified("if(true) {x} else {y}"), "x");
        assert_eq!(simplified("if(false) {x} else {y}"), "y");
        assert_eq!(simplified("if(p) {x+0} else {x}"), "x");
    }

    #[test]
    fn test_window_arguments_simplified() {
        assert_eq!(simplified("avg(close, 2+3, 0-1)"), "avg(close, 5, -1)");
    }

    #[test]
    fn test_idempotent() {
        for text in [
            "0-(x-x)+y*1",
            "not(not(x>y)) and (p or false)",
            "if(1<2) {avg(close, 5, -1)} else {f}",
            "-(0-x)*(f/f)",
        ] {
            let once = Expression::parse(text, &variables()).unwrap().simplify();
            let twice = once.clone().simplify();
            assert_eq!(once, twice, "{}", text);
        }
    }
}
