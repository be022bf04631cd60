use super::expression::{BinaryOp, Expression, UnaryOp};
use super::site::Site;
use crate::error::{GondolaError, Result};
use crate::types::Type;

impl Expression {
    /// Validates the tree bottom-up and returns its result type. Stops at the
    /// first violation.
    pub fn check_type(&self) -> Result<Type> {
        let child_types = self
            .children()
            .iter()
            .map(Expression::check_type)
            .collect::<Result<Vec<_>>>()?;
        self.result_type(&child_types)
    }

    /// Every node of the tree in pre-order, each with its result type.
    pub fn sites(&self) -> Result<Vec<Site>> {
        let mut sites = Vec::with_capacity(self.size());
        let mut path = Vec::new();
        self.collect_sites(&mut path, &mut sites)?;
        Ok(sites)
    }

    /// Nodes of the given result type. An ill-typed tree has none.
    pub fn sites_of_type(&self, ty: Type) -> Vec<Site> {
        self.sites()
            .map(|sites| sites.into_iter().filter(|site| site.ty == ty).collect())
            .unwrap_or_default()
    }

    pub fn size_of_kind(&self, ty: Type) -> usize {
        self.sites_of_type(ty).len()
    }

    fn collect_sites(&self, path: &mut Vec<usize>, sites: &mut Vec<Site>) -> Result<Type> {
        let index = sites.len();
        // Placeholder type until the children have been checked.
        sites.push(Site {
            path: path.clone(),
            ty: Type::Boolean,
        });

        let mut child_types = Vec::with_capacity(self.children().len());
        for (slot, child) in self.children().iter().enumerate() {
            path.push(slot);
            let ty = child.collect_sites(path, sites);
            path.pop();
            child_types.push(ty?);
        }

        let ty = self.result_type(&child_types)?;
        sites[index].ty = ty;
        Ok(ty)
    }

    /// Applies this node's typing rule to the already-checked child types.
    fn result_type(&self, children: &[Type]) -> Result<Type> {
        match self {
            Expression::Integer(_) | Expression::Calendar(_) => Ok(Type::Integer),
            Expression::Float(_) => Ok(Type::Float),
            Expression::Boolean(_) => Ok(Type::Boolean),
            Expression::Quote(kind) => Ok(kind.value_type()),
            Expression::Variable { ty, .. } => {
                if ty.is_quote() {
                    Err(GondolaError::type_mismatch("a non-quote variable", ty))
                } else {
                    Ok(*ty)
                }
            }
            Expression::Unary { op, .. } => unary_type(*op, children[0]),
            Expression::Binary { op, .. } => binary_type(*op, children[0], children[1]),
            Expression::Lag { .. } => {
                expect_quote("lag", children[0])?;
                expect("lag offset", Type::Integer, children[1])?;
                Ok(children[0].dequote())
            }
            Expression::Window { stat, .. } => {
                expect_quote(stat.name(), children[0])?;
                expect(stat.name(), Type::Integer, children[1])?;
                expect(stat.name(), Type::Integer, children[2])?;
                if stat.follows_quote() {
                    Ok(children[0].dequote())
                } else {
                    Ok(Type::Float)
                }
            }
            Expression::Correlation { .. } => {
                expect_quote("corr", children[0])?;
                expect("corr", Type::Integer, children[1])?;
                expect("corr", Type::Integer, children[2])?;
                Ok(Type::Float)
            }
            Expression::If { .. } => {
                expect("if condition", Type::Boolean, children[0])?;
                if children[1] != children[2] {
                    return Err(GondolaError::type_mismatch(
                        format!("matching if branches ({})", children[1]),
                        children[2],
                    ));
                }
                if children[1].is_quote() {
                    return Err(GondolaError::type_mismatch(
                        "a non-quote if branch",
                        children[1],
                    ));
                }
                Ok(children[1])
            }
        }
    }
}

fn unary_type(op: UnaryOp, child: Type) -> Result<Type> {
    match op {
        UnaryOp::Not => expect("not", Type::Boolean, child).map(|_| Type::Boolean),
        UnaryOp::Negate | UnaryOp::Abs => {
            expect_numeric(if op == UnaryOp::Abs { "abs" } else { "-" }, child)?;
            Ok(child)
        }
        UnaryOp::Sqrt => {
            expect_numeric("sqrt", child)?;
            Ok(Type::Float)
        }
    }
}

fn binary_type(op: BinaryOp, left: Type, right: Type) -> Result<Type> {
    if op.is_logic() {
        expect(op.symbol(), Type::Boolean, left)?;
        expect(op.symbol(), Type::Boolean, right)?;
        return Ok(Type::Boolean);
    }

    expect_numeric(op.symbol(), left)?;
    expect_numeric(op.symbol(), right)?;

    if op.is_comparison() {
        if left != right {
            return Err(GondolaError::type_mismatch(
                format!("both sides of '{}' to be {}", op.symbol(), left),
                right,
            ));
        }
        return Ok(Type::Boolean);
    }

    if left == Type::Integer && right == Type::Integer {
        Ok(Type::Integer)
    } else {
        Ok(Type::Float)
    }
}

fn expect(context: &str, expected: Type, actual: Type) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GondolaError::type_mismatch(
            format!("{} for '{}'", expected, context),
            actual,
        ))
    }
}

fn expect_numeric(context: &str, actual: Type) -> Result<()> {
    if actual.is_numeric() {
        Ok(())
    } else {
        Err(GondolaError::type_mismatch(
            format!("integer or float for '{}'", context),
            actual,
        ))
    }
}

fn expect_quote(context: &str, actual: Type) -> Result<()> {
    if actual.is_quote() {
        Ok(())
    } else {
        Err(GondolaError::type_mismatch(
            format!("a quote for '{}'", context),
            actual,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gondola::{Expression, Variables};

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.add("x", Type::Integer, true).unwrap();
        variables.add("f", Type::Float, true).unwrap();
        variables.add("b", Type::Boolean, true).unwrap();
        variables
    }

    fn check(text: &str) -> Result<Type> {
        Expression::parse(text, &variables()).unwrap().check_type()
    }

    #[test]
    fn test_comparison_yields_boolean() {
        assert_eq!(check("x > 3").unwrap(), Type::Boolean);
        assert_eq!(check("f <= 2.5").unwrap(), Type::Boolean);
    }

    #[test]
    fn test_comparison_of_boolean_and_integer_fails() {
        let err = check("b > 3").unwrap_err();
        assert!(matches!(err, GondolaError::TypeMismatch { .. }));
    }

    #[test]
    fn test_comparison_requires_same_type() {
        assert!(check("x > 2.5").is_err());
    }

    #[test]
    fn test_arithmetic_promotes_to_float() {
        assert_eq!(check("x + 1").unwrap(), Type::Integer);
        assert_eq!(check("x * 1.5").unwrap(), Type::Float);
    }

    #[test]
    fn test_window_follows_quote_kind() {
        assert_eq!(check("avg(close, 5, -1)").unwrap(), Type::Float);
        assert_eq!(check("avg(volume, 5, -1)").unwrap(), Type::Integer);
        assert_eq!(check("rsi(volume, 14, 0)").unwrap(), Type::Float);
        assert_eq!(check("corr(close, \"CBA\", 30, 0)").unwrap(), Type::Float);
    }

    #[test]
    fn test_window_rejects_non_quote_first_child() {
        assert!(check("avg(x, 5, 0)").is_err());
        assert!(check("avg(close, 2.5, 0)").is_err());
    }

    #[test]
    fn test_quote_cannot_be_compared_directly() {
        assert!(check("close > 3.0").is_err());
        assert_eq!(check("lag(close, 0) > 3.0").unwrap(), Type::Boolean);
    }

    #[test]
    fn test_if_branches_must_match() {
        assert_eq!(check("if(b) {x} else {3}").unwrap(), Type::Integer);
        assert!(check("if(b) {x} else {2.5}").is_err());
        assert!(check("if(x) {x} else {3}").is_err());
    }

    #[test]
    fn test_sites_carry_types() {
        let expr = Expression::parse("x > 3 and b", &variables()).unwrap();
        let sites = expr.sites().unwrap();
        assert_eq!(sites.len(), 5);
        assert_eq!(sites[0].ty, Type::Boolean);
        assert!(sites[0].is_root());
        assert_eq!(expr.size_of_kind(Type::Integer), 2);
        assert_eq!(expr.size_of_kind(Type::Boolean), 3);
    }
}
