use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{CleanRow, CleanTable, RawTable};
use crate::error::PipelineError;

static CURRENCY_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$,]").unwrap());

/// Result of cleaning one period cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing,
    /// Non-empty after cleaning but not a finite number; carries the original text.
    Malformed(String),
}

/// Trim, strip outer quotes, drop `$` and `,`, then parse.
pub fn clean_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let stripped = CURRENCY_NOISE.replace_all(unquoted, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return Cell::Missing;
    }

    // f64::from_str accepts "inf" and "NaN"; neither is an observation
    match stripped.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Malformed(raw.to_string()),
    }
}

/// Clean every period cell of `raw`. A row with any malformed period cell is dropped whole.
pub fn clean_table(raw: &RawTable) -> CleanTable {
    let period_cols = raw.period_columns();
    let width = raw.headers.len();

    let mut rows = Vec::with_capacity(raw.rows.len());
    let mut dropped_rows = 0;

    'rows: for (row_no, row) in raw.rows.iter().enumerate() {
        if row.len() > width {
            debug!(
                row = row_no,
                cells = row.len(),
                headers = width,
                "ignoring cells beyond header width"
            );
        }
        let location = row.first().cloned().unwrap_or_default();

        let mut cells = Vec::with_capacity(period_cols.len());
        for (col, name) in &period_cols {
            let text = row.get(*col).map(String::as_str).unwrap_or("");
            match clean_cell(text) {
                Cell::Value(v) => cells.push(Some(v)),
                Cell::Missing => cells.push(None),
                Cell::Malformed(value) => {
                    let err = PipelineError::MalformedCell {
                        location,
                        column: name.clone(),
                        value,
                    };
                    warn!(row = row_no, "{}; dropping row", err);
                    dropped_rows += 1;
                    continue 'rows;
                }
            }
        }

        rows.push(CleanRow { location, cells });
    }

    CleanTable {
        periods: period_cols.into_iter().map(|(_, name)| name).collect(),
        rows,
        dropped_rows,
    }
}
