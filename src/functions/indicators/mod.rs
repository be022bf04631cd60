pub mod momentum;
pub mod trend;
pub mod volatility;

pub use momentum::{Momentum, Rsi, NEUTRAL_RSI};
pub use trend::{Average, BollingerBands, Ema, Maximum, Minimum, Sum};
pub use volatility::{correlation, StdDev};

use crate::functions::traits::WindowIndicator;
use crate::gondola::WindowStat;

/// Indicator implementing a windowed statistic for the given period.
pub fn indicator(stat: WindowStat, period: usize) -> Box<dyn WindowIndicator> {
    match stat {
        WindowStat::Average => Box::new(Average),
        WindowStat::Minimum => Box::new(Minimum),
        WindowStat::Maximum => Box::new(Maximum),
        WindowStat::Sum => Box::new(Sum),
        WindowStat::Ema => Box::new(Ema::new(period)),
        WindowStat::StdDev => Box::new(StdDev),
        WindowStat::Momentum => Box::new(Momentum),
        WindowStat::Rsi => Box::new(Rsi),
        WindowStat::BollingerUpper => Box::new(BollingerBands::upper()),
        WindowStat::BollingerLower => Box::new(BollingerBands::lower()),
    }
}
