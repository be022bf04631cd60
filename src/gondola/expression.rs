use crate::types::{QuoteKind, Type};
use serde::{Deserialize, Serialize};

/// Single-child operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Abs,
    Sqrt,
}

/// Two-child operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub const ARITHMETIC: [BinaryOp; 4] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
    ];

    pub const COMPARISON: [BinaryOp; 6] = [
        BinaryOp::LessThan,
        BinaryOp::GreaterThan,
        BinaryOp::LessEqual,
        BinaryOp::GreaterEqual,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::GreaterThan
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
        )
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Multiply | Self::Equal | Self::NotEqual | Self::And | Self::Or
        )
    }

    /// Comparison with the opposite truth value, e.g. `>` becomes `<=`.
    pub fn negated(&self) -> Option<BinaryOp> {
        match self {
            Self::LessThan => Some(Self::GreaterEqual),
            Self::GreaterThan => Some(Self::LessEqual),
            Self::LessEqual => Some(Self::GreaterThan),
            Self::GreaterEqual => Some(Self::LessThan),
            Self::Equal => Some(Self::NotEqual),
            Self::NotEqual => Some(Self::Equal),
            _ => None,
        }
    }

    /// Binding strength used by the printer and the parser.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::LessThan
            | Self::GreaterThan
            | Self::LessEqual
            | Self::GreaterEqual
            | Self::Equal
            | Self::NotEqual => 3,
            Self::Add | Self::Subtract => 4,
            Self::Multiply | Self::Divide => 5,
        }
    }
}

/// Aggregates applied over a trailing window of quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowStat {
    Average,
    Minimum,
    Maximum,
    Sum,
    Ema,
    StdDev,
    Momentum,
    Rsi,
    BollingerUpper,
    BollingerLower,
}

impl WindowStat {
    pub const ALL: [WindowStat; 10] = [
        WindowStat::Average,
        WindowStat::Minimum,
        WindowStat::Maximum,
        WindowStat::Sum,
        WindowStat::Ema,
        WindowStat::StdDev,
        WindowStat::Momentum,
        WindowStat::Rsi,
        WindowStat::BollingerUpper,
        WindowStat::BollingerLower,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Average => "avg",
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Sum => "sum",
            Self::Ema => "ema",
            Self::StdDev => "stddev",
            Self::Momentum => "momentum",
            Self::Rsi => "rsi",
            Self::BollingerUpper => "bol_upper",
            Self::BollingerLower => "bol_lower",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|stat| stat.name() == name)
    }

    /// Whether the result carries the quote's own unit (price or volume).
    pub fn follows_quote(&self) -> bool {
        !matches!(self, Self::StdDev | Self::Rsi)
    }

    /// Momentum and RSI look at changes, so they need one day before the window.
    pub fn needs_previous_day(&self) -> bool {
        matches!(self, Self::Momentum | Self::Rsi)
    }
}

/// Calendar values of the reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarField {
    DayOfWeek,
    DayOfMonth,
    DayOfYear,
    Month,
    Year,
}

impl CalendarField {
    pub const ALL: [CalendarField; 5] = [
        CalendarField::DayOfWeek,
        CalendarField::DayOfMonth,
        CalendarField::DayOfYear,
        CalendarField::Month,
        CalendarField::Year,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DayOfWeek => "dayofweek",
            Self::DayOfMonth => "dayofmonth",
            Self::DayOfYear => "dayofyear",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }
}

/// A Gondola expression tree.
///
/// Every kind stores its children in a fixed-size array, so the arity of a
/// node is fixed by its kind and can never change after construction. Nodes
/// are addressed from the root by a path of child slot indices (see
/// [`Site`](super::site::Site)); there are no parent back-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Quote(QuoteKind),
    Variable { name: String, ty: Type },
    Calendar(CalendarField),
    Unary { op: UnaryOp, args: Box<[Expression; 1]> },
    Binary { op: BinaryOp, args: Box<[Expression; 2]> },
    /// `lag(quote, offset)`
    Lag { args: Box<[Expression; 2]> },
    /// `stat(quote, period, offset)`
    Window { stat: WindowStat, args: Box<[Expression; 3]> },
    /// `corr(quote, "PARTNER", period, offset)`
    Correlation { partner: String, args: Box<[Expression; 3]> },
    /// `if(condition) {then} else {otherwise}`
    If { args: Box<[Expression; 3]> },
}

impl Expression {
    pub fn variable(name: impl Into<String>, ty: Type) -> Self {
        Self::Variable {
            name: name.into(),
            ty,
        }
    }

    pub fn unary(op: UnaryOp, arg: Expression) -> Self {
        Self::Unary {
            op,
            args: Box::new([arg]),
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::Binary {
            op,
            args: Box::new([left, right]),
        }
    }

    pub fn not(arg: Expression) -> Self {
        Self::unary(UnaryOp::Not, arg)
    }

    pub fn negate(arg: Expression) -> Self {
        Self::unary(UnaryOp::Negate, arg)
    }

    pub fn lag(quote: Expression, offset: Expression) -> Self {
        Self::Lag {
            args: Box::new([quote, offset]),
        }
    }

    pub fn window(
        stat: WindowStat,
        quote: Expression,
        period: Expression,
        offset: Expression,
    ) -> Self {
        Self::Window {
            stat,
            args: Box::new([quote, period, offset]),
        }
    }

    pub fn correlation(
        quote: Expression,
        partner: impl Into<String>,
        period: Expression,
        offset: Expression,
    ) -> Self {
        Self::Correlation {
            partner: partner.into(),
            args: Box::new([quote, period, offset]),
        }
    }

    pub fn if_else(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Self::If {
            args: Box::new([condition, then, otherwise]),
        }
    }

    pub fn children(&self) -> &[Expression] {
        match self {
            Self::Integer(_)
            | Self::Float(_)
            | Self::Boolean(_)
            | Self::Quote(_)
            | Self::Variable { .. }
            | Self::Calendar(_) => &[],
            Self::Unary { args, .. } => &args[..],
            Self::Binary { args, .. } | Self::Lag { args } => &args[..],
            Self::Window { args, .. } | Self::Correlation { args, .. } | Self::If { args } => {
                &args[..]
            }
        }
    }

    pub fn children_mut(&mut self) -> &mut [Expression] {
        match self {
            Self::Integer(_)
            | Self::Float(_)
            | Self::Boolean(_)
            | Self::Quote(_)
            | Self::Variable { .. }
            | Self::Calendar(_) => &mut [],
            Self::Unary { args, .. } => &mut args[..],
            Self::Binary { args, .. } | Self::Lag { args } => &mut args[..],
            Self::Window { args, .. } | Self::Correlation { args, .. } | Self::If { args } => {
                &mut args[..]
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.children().is_empty()
    }

    /// Value of an integer or float literal.
    pub fn literal_value(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.literal_value() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.literal_value() == Some(1.0)
    }

    /// Number of nodes in the subtree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Expression::size).sum::<usize>()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Expression::depth)
            .max()
            .unwrap_or(0)
    }

    /// Whether `other` occurs anywhere in this tree.
    pub fn contains(&self, other: &Expression) -> bool {
        self == other || self.children().iter().any(|child| child.contains(other))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Quote(a), Self::Quote(b)) => a == b,
            (Self::Variable { name: a, ty: ta }, Self::Variable { name: b, ty: tb }) => {
                a == b && ta == tb
            }
            (Self::Calendar(a), Self::Calendar(b)) => a == b,
            (Self::Unary { op: a, args: x }, Self::Unary { op: b, args: y }) => a == b && x == y,
            (Self::Binary { op: a, args: x }, Self::Binary { op: b, args: y }) => {
                if a != b {
                    return false;
                }
                let [xl, xr] = &**x;
                let [yl, yr] = &**y;
                (xl == yl && xr == yr) || (a.is_commutative() && xl == yr && xr == yl)
            }
            (Self::Lag { args: x }, Self::Lag { args: y }) => x == y,
            (Self::Window { stat: a, args: x }, Self::Window { stat: b, args: y }) => {
                a == b && x == y
            }
            (
                Self::Correlation { partner: a, args: x },
                Self::Correlation { partner: b, args: y },
            ) => a.eq_ignore_ascii_case(b) && x == y,
            (Self::If { args: x }, Self::If { args: y }) => x == y,
            _ => false,
        }
    }
}
