use super::operators::weighted_choice;
use crate::{
    config::{ConfigSection, MutatorConfig},
    error::{GondolaError, Result},
    gondola::{insert, BinaryOp, CalendarField, Expression, Site, UnaryOp, Variables, WindowStat},
    types::{QuoteKind, Symbol, Type},
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Relative weights of insertion, deletion and modification
const MUTATION_WEIGHTS: [u32; 3] = [30, 20, 50];
/// Chance in percent that a numeric literal is perturbed rather than regenerated
const PERTURB_PERCENT: u32 = 80;
/// Chance in percent of one more mutation after each applied mutation
const FURTHER_MUTATION_PERCENT: u32 = 20;
/// Literal, calendar and variable weights for numeric terminals
const TERMINAL_WEIGHTS: [u32; 3] = [4, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Wrap the site in a fresh operator of the site's type
    Insertion,
    /// Replace the site by a fresh terminal
    Deletion,
    /// Replace the site by a fresh subtree, or perturb a numeric literal
    Modification,
}

impl MutationKind {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match weighted_choice(&MUTATION_WEIGHTS, rng) {
            Some(0) => Self::Insertion,
            Some(1) => Self::Deletion,
            _ => Self::Modification,
        }
    }
}

/// Role a child slot plays for its parent, which constrains what may fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotRole {
    Period,
    Offset,
    Free,
}

fn slot_role(tree: &Expression, path: &[usize]) -> SlotRole {
    let Some((&slot, parent)) = path.split_last() else {
        return SlotRole::Free;
    };
    match (tree.get(parent), slot) {
        (Some(Expression::Lag { .. }), 1) => SlotRole::Offset,
        (Some(Expression::Window { .. } | Expression::Correlation { .. }), 1) => SlotRole::Period,
        (Some(Expression::Window { .. } | Expression::Correlation { .. }), 2) => SlotRole::Offset,
        _ => SlotRole::Free,
    }
}

/// Operators a non-terminal of a given result type may be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Production {
    Compare(BinaryOp),
    Logic(BinaryOp),
    Not,
    Arithmetic(BinaryOp),
    Unary(UnaryOp),
    Lag,
    Window(WindowStat),
    Correlation,
    If,
}

/// Builds random well-typed trees and mutates existing ones.
pub struct Mutator {
    config: MutatorConfig,
    /// Context variables trees may refer to, with their types
    variables: Vec<(String, Type)>,
    /// Symbols available as correlation partners
    partners: Vec<Symbol>,
}

impl Mutator {
    /// Every variable named by the configuration must be declared in `context`.
    pub fn new(config: MutatorConfig, context: &Variables, partners: Vec<Symbol>) -> Result<Self> {
        config.validate()?;
        let variables = config
            .variables
            .iter()
            .map(|name| {
                context
                    .type_of(name)
                    .map(|ty| (name.clone(), ty))
                    .ok_or_else(|| {
                        GondolaError::Configuration(format!(
                            "Mutator variable {} is not in the trading context",
                            name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            variables,
            partners,
        })
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    /// Random tree of type `ty` whose root sits at `level` (the root of a
    /// rule is level 1).
    pub fn create_random<R: Rng + ?Sized>(
        &self,
        ty: Type,
        level: usize,
        rng: &mut R,
    ) -> Expression {
        if ty.is_quote() {
            return self.create_random_quote(ty, rng);
        }
        if level > self.config.max_level {
            return self.create_random_terminal(ty, rng);
        }

        let branch = (self.config.branch_factor / level.max(1) as f64).min(1.0);
        if ty == Type::Boolean || rng.gen::<f64>() < branch {
            self.create_random_non_terminal(ty, level, rng)
        } else {
            self.create_random_terminal(ty, rng)
        }
    }

    /// A leaf of type `ty`. Boolean leaves are pointless, so a boolean
    /// request yields a comparison between two numeric terminals.
    pub fn create_random_terminal<R: Rng + ?Sized>(&self, ty: Type, rng: &mut R) -> Expression {
        match ty {
            Type::Boolean => {
                let operand = random_numeric_type(rng);
                let op = random_of(&BinaryOp::COMPARISON, rng);
                Expression::binary(
                    op,
                    self.create_random_terminal(operand, rng),
                    self.create_random_terminal(operand, rng),
                )
            }
            Type::IntegerQuote | Type::FloatQuote => self.create_random_quote(ty, rng),
            Type::Integer | Type::Float => {
                let variables: Vec<&(String, Type)> = self
                    .variables
                    .iter()
                    .filter(|(_, variable_type)| *variable_type == ty)
                    .collect();
                let calendar = ty == Type::Integer && self.config.allow_calendar;
                let weights = [
                    TERMINAL_WEIGHTS[0],
                    if calendar { TERMINAL_WEIGHTS[1] } else { 0 },
                    if variables.is_empty() { 0 } else { TERMINAL_WEIGHTS[2] },
                ];

                match weighted_choice(&weights, rng) {
                    Some(1) => Expression::Calendar(random_of(&CalendarField::ALL, rng)),
                    Some(2) => match variables.choose(rng) {
                        Some((name, variable_type)) => {
                            Expression::variable(name.clone(), *variable_type)
                        }
                        None => self.create_random_literal(ty, rng),
                    },
                    _ => self.create_random_literal(ty, rng),
                }
            }
        }
    }

    /// An operator node of result type `ty`, picked uniformly among the
    /// operators that produce it, with random children one level down.
    pub fn create_random_non_terminal<R: Rng + ?Sized>(
        &self,
        ty: Type,
        level: usize,
        rng: &mut R,
    ) -> Expression {
        let productions = self.productions(ty);
        let Some(&production) = productions.choose(rng) else {
            return self.create_random_terminal(ty, rng);
        };
        let child = level + 1;

        match production {
            Production::Compare(op) => {
                let operand = random_numeric_type(rng);
                Expression::binary(
                    op,
                    self.create_random(operand, child, rng),
                    self.create_random(operand, child, rng),
                )
            }
            Production::Logic(op) => Expression::binary(
                op,
                self.create_random(Type::Boolean, child, rng),
                self.create_random(Type::Boolean, child, rng),
            ),
            Production::Not => Expression::not(self.create_random(Type::Boolean, child, rng)),
            Production::Arithmetic(op) => {
                let (left, right) = arithmetic_operand_types(ty, rng);
                Expression::binary(
                    op,
                    self.create_random(left, child, rng),
                    self.create_random(right, child, rng),
                )
            }
            Production::Unary(UnaryOp::Sqrt) => {
                let operand = random_numeric_type(rng);
                Expression::unary(UnaryOp::Sqrt, self.create_random(operand, child, rng))
            }
            Production::Unary(op) => Expression::unary(op, self.create_random(ty, child, rng)),
            Production::Lag => Expression::lag(
                self.create_random_quote(quote_type_of(ty), rng),
                self.create_random_offset(rng),
            ),
            Production::Window(stat) => {
                let quote = if stat.follows_quote() {
                    self.create_random_quote(quote_type_of(ty), rng)
                } else {
                    Expression::Quote(random_of(&QuoteKind::ALL, rng))
                };
                Expression::window(
                    stat,
                    quote,
                    self.create_random_period(rng),
                    self.create_random_offset(rng),
                )
            }
            Production::Correlation => {
                let partner = self
                    .partners
                    .choose(rng)
                    .map(|symbol| symbol.as_str().to_string())
                    .unwrap_or_default();
                Expression::correlation(
                    Expression::Quote(random_of(&QuoteKind::ALL, rng)),
                    partner,
                    self.create_random_period(rng),
                    self.create_random_offset(rng),
                )
            }
            Production::If => Expression::if_else(
                self.create_random(Type::Boolean, child, rng),
                self.create_random(ty, child, rng),
                self.create_random(ty, child, rng),
            ),
        }
    }

    fn productions(&self, ty: Type) -> Vec<Production> {
        let mut productions = Vec::new();
        match ty {
            Type::Boolean => {
                productions.extend(BinaryOp::COMPARISON.iter().map(|op| Production::Compare(*op)));
                productions.push(Production::Logic(BinaryOp::And));
                productions.push(Production::Logic(BinaryOp::Or));
                productions.push(Production::Not);
            }
            Type::Integer | Type::Float => {
                productions.extend(BinaryOp::ARITHMETIC.map(Production::Arithmetic));
                productions.push(Production::Unary(UnaryOp::Negate));
                productions.push(Production::Unary(UnaryOp::Abs));
                productions.push(Production::Lag);
                productions.push(Production::If);
                for stat in WindowStat::ALL {
                    if ty == Type::Float || stat.follows_quote() {
                        productions.push(Production::Window(stat));
                    }
                }
                if ty == Type::Float {
                    productions.push(Production::Unary(UnaryOp::Sqrt));
                    if !self.partners.is_empty() {
                        productions.push(Production::Correlation);
                    }
                }
            }
            Type::IntegerQuote | Type::FloatQuote => {}
        }
        productions
    }

    /// Quote terminal of the given quote type; any kind for other types.
    pub fn create_random_quote<R: Rng + ?Sized>(&self, ty: Type, rng: &mut R) -> Expression {
        let kind = match ty {
            Type::IntegerQuote => QuoteKind::Volume,
            Type::FloatQuote => random_of(&QuoteKind::PRICES, rng),
            _ => random_of(&QuoteKind::ALL, rng),
        };
        Expression::Quote(kind)
    }

    fn create_random_literal<R: Rng + ?Sized>(&self, ty: Type, rng: &mut R) -> Expression {
        if ty == Type::Float {
            let max = self.config.max_float;
            Expression::Float((rng.gen_range(-max..max) * 100.0).round() / 100.0)
        } else {
            let max = self.config.max_integer;
            Expression::Integer(rng.gen_range(-max..=max))
        }
    }

    fn create_random_period<R: Rng + ?Sized>(&self, rng: &mut R) -> Expression {
        Expression::Integer(rng.gen_range(1..=self.config.max_period))
    }

    fn create_random_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Expression {
        Expression::Integer(rng.gen_range(-self.config.max_offset..=0))
    }

    /// With probability `percent/100` applies one random mutation, then keeps
    /// applying further ones with a small fixed probability.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        tree: Expression,
        percent: u32,
        rng: &mut R,
    ) -> Expression {
        if rng.gen_range(0..100) >= percent {
            return tree;
        }

        let mut tree = self.mutate_once(tree, rng);
        while rng.gen_range(0..100) < FURTHER_MUTATION_PERCENT {
            tree = self.mutate_once(tree, rng);
        }
        tree
    }

    fn mutate_once<R: Rng + ?Sized>(&self, tree: Expression, rng: &mut R) -> Expression {
        let Some(site) = find_random_site(&tree, rng) else {
            return tree;
        };
        let kind = MutationKind::random(rng);
        log::debug!("{:?} at {:?} in '{}'", kind, site.path, tree);
        self.apply(tree, &site, kind, rng)
    }

    /// Applies one mutation of the given kind at `site`.
    ///
    /// Window periods and offsets are only ever modified, so they stay
    /// positive and non-positive literals respectively. Insertion on a quote
    /// site and deletion on the root or a terminal fall back to modification.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        tree: Expression,
        site: &Site,
        kind: MutationKind,
        rng: &mut R,
    ) -> Expression {
        let Some(subtree) = tree.get(&site.path) else {
            return tree;
        };

        let replacement = match slot_role(&tree, &site.path) {
            SlotRole::Period => match subtree {
                Expression::Integer(value) if self.perturbs(rng) => {
                    Expression::Integer(self.perturb_integer(*value, rng).max(1))
                }
                _ => self.create_random_period(rng),
            },
            SlotRole::Offset => match subtree {
                Expression::Integer(value) if self.perturbs(rng) => {
                    Expression::Integer(self.perturb_integer(*value, rng).min(0))
                }
                _ => self.create_random_offset(rng),
            },
            SlotRole::Free => match kind {
                MutationKind::Insertion if !site.ty.is_quote() => {
                    self.wrap(subtree.clone(), site.ty, site.level(), rng)
                }
                MutationKind::Deletion if !site.is_root() && !subtree.is_terminal() => {
                    self.create_random_terminal(site.ty, rng)
                }
                _ => self.modify(subtree, site.ty, site.level(), rng),
            },
        };

        insert(tree, &site.path, replacement)
    }

    fn modify<R: Rng + ?Sized>(
        &self,
        subtree: &Expression,
        ty: Type,
        level: usize,
        rng: &mut R,
    ) -> Expression {
        match subtree {
            Expression::Integer(value) if self.perturbs(rng) => {
                Expression::Integer(self.perturb_integer(*value, rng))
            }
            Expression::Float(value) if self.perturbs(rng) => {
                Expression::Float(value + signed_power_of_ten(rng))
            }
            _ => self.create_random(ty, level, rng),
        }
    }

    fn perturbs<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..100) < PERTURB_PERCENT
    }

    fn perturb_integer<R: Rng + ?Sized>(&self, value: i64, rng: &mut R) -> i64 {
        value.saturating_add(signed_power_of_ten(rng).round() as i64)
    }

    /// Fresh operator of type `ty` holding `subtree` in one of its slots.
    fn wrap<R: Rng + ?Sized>(
        &self,
        subtree: Expression,
        ty: Type,
        level: usize,
        rng: &mut R,
    ) -> Expression {
        let child = level + 1;
        let first = rng.gen_bool(0.5);

        if ty == Type::Boolean {
            return match rng.gen_range(0..3) {
                0 => Expression::not(subtree),
                choice => {
                    let op = if choice == 1 { BinaryOp::And } else { BinaryOp::Or };
                    let other = self.create_random(Type::Boolean, child, rng);
                    ordered_binary(op, subtree, other, first)
                }
            };
        }

        match rng.gen_range(0..4) {
            0 => {
                let op = random_of(&BinaryOp::ARITHMETIC, rng);
                let other_type = if ty == Type::Float {
                    random_numeric_type(rng)
                } else {
                    Type::Integer
                };
                let other = self.create_random(other_type, child, rng);
                ordered_binary(op, subtree, other, first)
            }
            1 => Expression::negate(subtree),
            2 => Expression::unary(UnaryOp::Abs, subtree),
            _ => {
                let condition = self.create_random(Type::Boolean, child, rng);
                let other = self.create_random(ty, child, rng);
                if first {
                    Expression::if_else(condition, subtree, other)
                } else {
                    Expression::if_else(condition, other, subtree)
                }
            }
        }
    }

    /// Splices a copy of a random same-typed subtree of `source` into a
    /// random site of `destination`. A no-op when `source` has no subtree of
    /// the chosen site's type.
    ///
    /// Window periods and offsets only take integer literals, clamped the way
    /// [`Mutator::apply`] clamps them.
    pub fn recombine<R: Rng + ?Sized>(
        &self,
        destination: Expression,
        source: &Expression,
        rng: &mut R,
    ) -> Expression {
        let Some(site) = find_random_site(&destination, rng) else {
            return destination;
        };

        let replacement = match slot_role(&destination, &site.path) {
            SlotRole::Free => find_random_site_of_type(source, site.ty, rng)
                .and_then(|donor| source.get(&donor.path))
                .cloned(),
            SlotRole::Period => {
                random_integer_literal(source, rng).map(|value| Expression::Integer(value.max(1)))
            }
            SlotRole::Offset => {
                random_integer_literal(source, rng).map(|value| Expression::Integer(value.min(0)))
            }
        };

        match replacement {
            Some(subtree) => insert(destination, &site.path, subtree),
            None => destination,
        }
    }
}

/// Uniformly random node of the tree; `None` for an ill-typed tree.
pub fn find_random_site<R: Rng + ?Sized>(tree: &Expression, rng: &mut R) -> Option<Site> {
    tree.sites().ok()?.choose(rng).cloned()
}

/// Uniformly random node of the given type.
pub fn find_random_site_of_type<R: Rng + ?Sized>(
    tree: &Expression,
    ty: Type,
    rng: &mut R,
) -> Option<Site> {
    tree.sites_of_type(ty).choose(rng).cloned()
}

/// Value of a uniformly random integer literal in `tree`.
fn random_integer_literal<R: Rng + ?Sized>(tree: &Expression, rng: &mut R) -> Option<i64> {
    let literals: Vec<i64> = tree
        .sites_of_type(Type::Integer)
        .iter()
        .filter_map(|site| match tree.get(&site.path) {
            Some(Expression::Integer(value)) => Some(*value),
            _ => None,
        })
        .collect();
    literals.choose(rng).copied()
}

fn random_of<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> T {
    items[rng.gen_range(0..items.len())]
}

fn random_numeric_type<R: Rng + ?Sized>(rng: &mut R) -> Type {
    if rng.gen_bool(0.5) {
        Type::Integer
    } else {
        Type::Float
    }
}

/// Operand types of an arithmetic node producing `ty`.
fn arithmetic_operand_types<R: Rng + ?Sized>(ty: Type, rng: &mut R) -> (Type, Type) {
    if ty == Type::Integer {
        return (Type::Integer, Type::Integer);
    }
    match rng.gen_range(0..3) {
        0 => (Type::Float, Type::Float),
        1 => (Type::Float, Type::Integer),
        _ => (Type::Integer, Type::Float),
    }
}

fn quote_type_of(ty: Type) -> Type {
    if ty == Type::Integer {
        Type::IntegerQuote
    } else {
        Type::FloatQuote
    }
}

fn ordered_binary(
    op: BinaryOp,
    kept: Expression,
    other: Expression,
    kept_first: bool,
) -> Expression {
    if kept_first {
        Expression::binary(op, kept, other)
    } else {
        Expression::binary(op, other, kept)
    }
}

/// `±10^u` with `u` uniform in `[0, 6)`.
fn signed_power_of_ten<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let magnitude = 10f64.powf(rng.gen_range(0.0..6.0));
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}
