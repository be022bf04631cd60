mod csv;
mod types;
mod validator;

pub use csv::CsvQuoteLoader;
pub use types::{LoadReport, RequiredColumn};
pub use validator::DataValidator;
