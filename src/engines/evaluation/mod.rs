pub mod expression;
pub mod paper_trade;
pub mod portfolio;

pub use paper_trade::{PaperTrade, SimplePaperTrader};
pub use portfolio::{Portfolio, Position, Trade};
