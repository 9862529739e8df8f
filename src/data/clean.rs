use crate::error::SchemaError;

use super::datetime::parse_datetime;
use super::model::{Row, Table, Value};

/// Column holding the nightly price used for outlier removal.
pub const PRICE_COLUMN: &str = "price";
/// Column converted to a canonical date/time.
pub const LAST_REVIEW_COLUMN: &str = "last_review";

// ---------------------------------------------------------------------------
// Price bounds
// ---------------------------------------------------------------------------

/// Inclusive price range. `min_price > max_price` is allowed and simply
/// matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min_price: f64,
    pub max_price: f64,
}

impl PriceBounds {
    pub fn new(min_price: f64, max_price: f64) -> Self {
        PriceBounds { min_price, max_price }
    }

    /// `min_price <= price <= max_price`. NaN never matches.
    pub fn contains(&self, price: f64) -> bool {
        self.min_price <= price && price <= self.max_price
    }

    pub fn is_inverted(&self) -> bool {
        self.min_price > self.max_price
    }
}

// ---------------------------------------------------------------------------
// Cleaner
// ---------------------------------------------------------------------------

/// Row counts gathered while cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub rows_in: usize,
    pub rows_kept: usize,
    /// Non-null `last_review` cells that could not be parsed.
    pub unparsed_dates: usize,
}

impl CleanStats {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_kept
    }
}

/// Result of [`clean`]: the new table plus what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub table: Table,
    pub stats: CleanStats,
}

/// Drop rows whose price falls outside `bounds` and convert `last_review`
/// to a date/time.
///
/// Rows keep their relative order and every other cell is copied as-is.
/// A null or non-numeric price fails the range test. A `last_review` cell
/// that cannot be parsed becomes null instead of failing the call.
///
/// # Errors
///
/// [`SchemaError::MissingColumn`] when `price` or `last_review` is absent.
pub fn clean(table: &Table, bounds: PriceBounds) -> Result<CleanedTable, SchemaError> {
    let price_idx = required_column(table, PRICE_COLUMN)?;
    let review_idx = required_column(table, LAST_REVIEW_COLUMN)?;

    let mut unparsed_dates = 0;
    let rows: Vec<Row> = table
        .rows
        .iter()
        .filter(|row| {
            price_of(row.get(price_idx)).is_some_and(|price| bounds.contains(price))
        })
        .map(|row| {
            let mut row = row.clone();
            let raw = row.get(review_idx);
            let parsed = parse_datetime(raw);
            if !parsed.is_parsed() && !raw.is_null() {
                unparsed_dates += 1;
            }
            if let Some(cell) = row.values.get_mut(review_idx) {
                *cell = parsed.into();
            }
            row
        })
        .collect();

    let stats = CleanStats {
        rows_in: table.len(),
        rows_kept: rows.len(),
        unparsed_dates,
    };
    Ok(CleanedTable {
        table: Table::new(table.columns.clone(), rows),
        stats,
    })
}

/// Numeric reading of a price cell. Text cells count when they hold a
/// number, so one stray entry in a price column only drops its own row.
fn price_of(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
}

fn required_column(table: &Table, name: &str) -> Result<usize, SchemaError> {
    table
        .column_index(name)
        .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
}
