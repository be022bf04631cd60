/// Columns a long-format quote file must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredColumn {
    Date,
    Symbol,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl RequiredColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Symbol => "symbol",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Date,
            Self::Symbol,
            Self::Open,
            Self::High,
            Self::Low,
            Self::Close,
            Self::Volume,
        ]
    }

    /// Columns holding quote values
    pub fn ohlcv() -> Vec<Self> {
        vec![Self::Open, Self::High, Self::Low, Self::Close, Self::Volume]
    }

    /// Common alternative column names
    pub fn aliases(&self) -> Vec<&'static str> {
        match self {
            Self::Date => vec!["date", "Date", "DATE", "datetime", "timestamp"],
            Self::Symbol => vec!["symbol", "Symbol", "SYMBOL", "ticker", "Ticker", "code"],
            Self::Open => vec!["open", "Open", "OPEN", "o"],
            Self::High => vec!["high", "High", "HIGH", "h"],
            Self::Low => vec!["low", "Low", "LOW", "l"],
            Self::Close => vec!["close", "Close", "CLOSE", "c"],
            Self::Volume => vec!["volume", "Volume", "VOLUME", "vol", "Vol", "v"],
        }
    }
}

/// Outcome of loading a quote file
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub rows: usize,
    pub symbols: usize,
    pub days: usize,
    /// Rows dropped because a value was null or the symbol malformed
    pub skipped: usize,
}
