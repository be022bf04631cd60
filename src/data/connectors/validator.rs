use crate::error::{GondolaError, Result};
use polars::prelude::*;
use super::types::RequiredColumn;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Validate that a long-format quote frame has the date, symbol and OHLCV
    /// columns, returning the actual name found for each.
    pub fn validate_quotes(df: &DataFrame) -> Result<HashMap<RequiredColumn, String>> {
        let mut column_map = HashMap::new();

        for required in RequiredColumn::all() {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name.to_string());
                }
                None => {
                    return Err(GondolaError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        for required in RequiredColumn::ohlcv() {
            let actual_name = Self::column_name(&column_map, required)?;
            let series = df.column(actual_name)?;
            if !matches!(
                series.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::UInt64
                    | DataType::UInt32
            ) {
                return Err(GondolaError::DataLoading(format!(
                    "Column '{}' ({}) must be numeric, found {:?}",
                    actual_name,
                    required.as_str(),
                    series.dtype()
                )));
            }
        }

        Self::validate_ohlc_relationships(df, &column_map)?;

        Ok(column_map)
    }

    pub fn column_name(
        column_map: &HashMap<RequiredColumn, String>,
        required: RequiredColumn,
    ) -> Result<&str> {
        column_map
            .get(&required)
            .map(String::as_str)
            .ok_or_else(|| {
                GondolaError::DataLoading(format!("Missing required column: {}", required.as_str()))
            })
    }

    /// Find column by checking aliases
    fn find_column<'a>(df: &'a DataFrame, required: &RequiredColumn) -> Option<&'a str> {
        let columns = df.get_column_names();
        for alias in required.aliases() {
            if columns.iter().any(|col| col.as_str() == alias) {
                return Some(alias);
            }
        }
        None
    }

    /// Validate OHLC relationships (high >= low, high >= open, high >= close, etc.)
    fn validate_ohlc_relationships(
        df: &DataFrame,
        column_map: &HashMap<RequiredColumn, String>,
    ) -> Result<()> {
        let price = |required| -> Result<Column> {
            let name = Self::column_name(column_map, required)?;
            Ok(df.column(name)?.cast(&DataType::Float64)?)
        };
        let high = price(RequiredColumn::High)?;
        let low = price(RequiredColumn::Low)?;
        let open = price(RequiredColumn::Open)?;
        let close = price(RequiredColumn::Close)?;

        let high = high.f64()?;
        let low = low.f64()?;
        let open = open.f64()?;
        let close = close.f64()?;

        for i in 0..df.height() {
            if let (Some(h), Some(l), Some(o), Some(c)) = (
                high.get(i),
                low.get(i),
                open.get(i),
                close.get(i),
            ) {
                if h < l {
                    return Err(GondolaError::DataLoading(format!(
                        "Invalid data at row {}: high ({}) < low ({})",
                        i, h, l
                    )));
                }
                if h < o || h < c {
                    return Err(GondolaError::DataLoading(format!(
                        "Invalid data at row {}: high ({}) < open ({}) or close ({})",
                        i, h, o, c
                    )));
                }
                if l > o || l > c {
                    return Err(GondolaError::DataLoading(format!(
                        "Invalid data at row {}: low ({}) > open ({}) or close ({})",
                        i, l, o, c
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(GondolaError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Null counts per column, for columns that have any
    pub fn check_nulls(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .filter(|column| column.null_count() > 0)
            .map(|column| (column.name().to_string(), column.null_count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_good_data() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "symbol" => &["BHP", "BHP"],
            "open" => &[100.0, 101.0],
            "high" => &[101.0, 103.0],
            "low" => &[99.0, 100.0],
            "close" => &[100.5, 102.0],
            "volume" => &[1000i64, 1500],
        }
        .unwrap();

        let column_map = DataValidator::validate_quotes(&df).unwrap();
        assert_eq!(column_map[&RequiredColumn::Symbol], "symbol");
    }

    #[test]
    fn test_validate_missing_symbol_column() {
        let df = df! {
            "date" => &["2024-01-02"],
            "open" => &[100.0],
            "high" => &[101.0],
            "low" => &[99.0],
            "close" => &[100.5],
            "volume" => &[1000i64],
        }
        .unwrap();

        let err = DataValidator::validate_quotes(&df).unwrap_err();
        assert!(err.to_string().contains("symbol"));
    }

    #[test]
    fn test_validate_invalid_ohlc() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "symbol" => &["BHP", "BHP"],
            "open" => &[100.0, 101.0],
            "high" => &[99.0, 103.0], // High < Open at row 0
            "low" => &[99.0, 100.0],
            "close" => &[100.5, 102.0],
            "volume" => &[1000i64, 1500],
        }
        .unwrap();

        assert!(DataValidator::validate_quotes(&df).is_err());
    }

    #[test]
    fn test_column_aliases() {
        let df = df! {
            "Date" => &["2024-01-02", "2024-01-03"],
            "Ticker" => &["BHP", "BHP"],
            "Open" => &[100.0, 101.0],
            "HIGH" => &[101.0, 103.0],
            "low" => &[99.0, 100.0],
            "Close" => &[100.5, 102.0],
            "Vol" => &[1000i64, 1500],
        }
        .unwrap();

        let column_map = DataValidator::validate_quotes(&df).unwrap();
        assert_eq!(column_map[&RequiredColumn::Volume], "Vol");
        assert_eq!(column_map[&RequiredColumn::Symbol], "Ticker");
    }
}
