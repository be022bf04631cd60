//! The Gondola expression language: node model, typing, printing, parsing
//! and simplification.

pub mod display;
pub mod expression;
pub mod parser;
pub mod simplify;
pub mod site;
pub mod type_check;
pub mod variables;

pub use expression::{BinaryOp, CalendarField, Expression, UnaryOp, WindowStat};
pub use site::{insert, Site};
pub use variables::{Variable, Variables};
