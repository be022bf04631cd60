pub mod bundle;
pub mod connectors;
pub mod quote_source;

pub use bundle::{Quote, QuoteBundle};
pub use connectors::{CsvQuoteLoader, LoadReport};
pub use quote_source::{quote_or_zero, window_pairs, window_samples, QuoteSource};
