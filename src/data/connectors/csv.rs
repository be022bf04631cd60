use crate::data::bundle::{Quote, QuoteBundle};
use crate::error::{GondolaError, Result};
use crate::types::Symbol;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use super::{
    types::{LoadReport, RequiredColumn},
    validator::DataValidator,
};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y"];

/// Loads long-format quote files: one row per symbol and trading day.
pub struct CsvQuoteLoader;

impl CsvQuoteLoader {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| GondolaError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load, validate and convert a CSV file into a quote bundle
    pub fn load_bundle<P: AsRef<Path>>(
        path: P,
        min_rows: Option<usize>,
    ) -> Result<(QuoteBundle, LoadReport)> {
        let df = Self::load(&path)?;

        let column_map = DataValidator::validate_quotes(&df)?;
        DataValidator::validate_minimum_rows(&df, min_rows.unwrap_or(1))?;

        let null_report = DataValidator::check_nulls(&df);
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        let (bundle, report) = Self::to_bundle(&df, &column_map)?;
        log::info!(
            "Loaded {} rows for {} symbols over {} days from {}",
            report.rows,
            report.symbols,
            report.days,
            path.as_ref().display()
        );
        Ok((bundle, report))
    }

    /// Convert a validated frame. Rows with a null value or a malformed
    /// symbol are skipped; an unreadable date fails the whole load.
    pub fn to_bundle(
        df: &DataFrame,
        column_map: &HashMap<RequiredColumn, String>,
    ) -> Result<(QuoteBundle, LoadReport)> {
        let text = |required| -> Result<Column> {
            let name = DataValidator::column_name(column_map, required)?;
            Ok(df.column(name)?.cast(&DataType::String)?)
        };
        let numeric = |required, dtype: DataType| -> Result<Column> {
            let name = DataValidator::column_name(column_map, required)?;
            Ok(df.column(name)?.cast(&dtype)?)
        };

        let dates = text(RequiredColumn::Date)?;
        let symbols = text(RequiredColumn::Symbol)?;
        let open = numeric(RequiredColumn::Open, DataType::Float64)?;
        let high = numeric(RequiredColumn::High, DataType::Float64)?;
        let low = numeric(RequiredColumn::Low, DataType::Float64)?;
        let close = numeric(RequiredColumn::Close, DataType::Float64)?;
        let volume = numeric(RequiredColumn::Volume, DataType::Int64)?;

        let (dates, symbols) = (dates.str()?, symbols.str()?);
        let (open, high, low, close) = (open.f64()?, high.f64()?, low.f64()?, close.f64()?);
        let volume = volume.i64()?;

        let mut report = LoadReport::default();
        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let row = (
                dates.get(i),
                symbols.get(i),
                open.get(i),
                high.get(i),
                low.get(i),
                close.get(i),
                volume.get(i),
            );
            let (Some(date), Some(symbol), Some(o), Some(h), Some(l), Some(c), Some(v)) = row else {
                report.skipped += 1;
                continue;
            };
            let symbol = match Symbol::parse(symbol) {
                Ok(symbol) => symbol,
                Err(e) => {
                    log::warn!("Skipping row {}: {}", i, e);
                    report.skipped += 1;
                    continue;
                }
            };
            let date = Self::parse_date(date).ok_or_else(|| {
                GondolaError::DataLoading(format!("Invalid date '{}' at row {}", date, i))
            })?;
            records.push((symbol, date, Quote::new(o, h, l, c, v)));
        }

        report.rows = records.len();
        let bundle = QuoteBundle::from_records(records)?;
        report.symbols = bundle.num_symbols();
        report.days = bundle.num_days();
        Ok((bundle, report))
    }

    fn parse_date(text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        // Datetime columns keep only their date part.
        let text = text.split(['T', ' ']).next().unwrap_or(text);
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::QuoteSource;
    use crate::types::QuoteKind;
    use polars::df;

    #[test]
    fn test_to_bundle_skips_bad_symbols() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03", "2024-01-03"],
            "symbol" => &["bhp", "BHP", "B H P"],
            "open" => &[100.0, 101.0, 1.0],
            "high" => &[101.0, 103.0, 1.0],
            "low" => &[99.0, 100.0, 1.0],
            "close" => &[100.5, 102.0, 1.0],
            "volume" => &[1000i64, 1500, 1],
        }
        .unwrap();

        let column_map = DataValidator::validate_quotes(&df).unwrap();
        let (bundle, report) = CsvQuoteLoader::to_bundle(&df, &column_map).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.days, 2);
        let bhp = Symbol::parse("BHP").unwrap();
        assert_eq!(bundle.get_quote(&bhp, QuoteKind::Close, 1, 0).unwrap(), 102.0);
    }

    #[test]
    fn test_load_bundle_from_file() {
        let path = std::env::temp_dir().join(format!("gondola_quotes_{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "date,symbol,open,high,low,close,volume\n\
             2024-01-02,BHP,10.0,11.0,9.5,10.5,1000\n\
             2024-01-02,CBA,90.0,91.0,89.0,90.5,500\n\
             2024-01-03,BHP,10.5,11.5,10.0,11.0,1200\n",
        )
        .unwrap();

        let (bundle, report) = CsvQuoteLoader::load_bundle(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.symbols, 2);
        assert_eq!(bundle.num_days(), 2);
        let cba = Symbol::parse("CBA").unwrap();
        assert!(bundle.get_quote(&cba, QuoteKind::Close, 1, 0).is_err());
        assert_eq!(bundle.get_quote(&cba, QuoteKind::Volume, 0, 0).unwrap(), 500.0);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(CsvQuoteLoader::parse_date("2024-03-05"), expected);
        assert_eq!(CsvQuoteLoader::parse_date("20240305"), expected);
        assert_eq!(CsvQuoteLoader::parse_date("05/03/2024"), expected);
        assert_eq!(CsvQuoteLoader::parse_date("2024-03-05T00:00:00"), expected);
        assert_eq!(CsvQuoteLoader::parse_date("March"), None);
    }
}
