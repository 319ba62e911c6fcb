// src/table/mod.rs
use csv::ReaderBuilder;
use std::{fmt, fs::File, io::Read, path::Path};
use tracing::debug;

use crate::error::{PipelineError, Result};

pub mod clean;
pub mod period;

pub use clean::{clean_cell, clean_table, Cell};
pub use period::PeriodLabel;

/// Which extract a table came from. Order of the variants is merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    City,
    County,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::City => "city",
            SourceKind::County => "county",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Header row; index 0 is the location label column.
    pub headers: Vec<String>,
    /// Each data row as raw text, one entry per field.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse a CSV extract with a header row. Rows may be shorter or longer than the header.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Indexes and names of the `"Mon - YYYY"` columns, in file order.
    pub fn period_columns(&self) -> Vec<(usize, String)> {
        self.headers
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, h)| h.contains(" - "))
            .map(|(i, h)| (i, h.clone()))
            .collect()
    }
}

/// Open and parse one source extract, mapping every failure to `SourceUnreadable`.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_raw_table<P: AsRef<Path>>(path: P, kind: SourceKind) -> Result<RawTable> {
    let path = path.as_ref();
    let unreadable = |reason: String| PipelineError::SourceUnreadable {
        source_kind: kind,
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let table = RawTable::from_reader(file).map_err(|e| unreadable(e.to_string()))?;
    if table.headers.is_empty() || table.headers.iter().all(String::is_empty) {
        return Err(unreadable("no header row".into()));
    }

    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded {} table",
        kind
    );
    Ok(table)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanRow {
    pub location: String,
    /// One entry per period column; `None` is a missing observation.
    pub cells: Vec<Option<f64>>,
}

/// A `RawTable` reduced to its label and period columns, every cell finite or missing.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    pub periods: Vec<String>,
    pub rows: Vec<CleanRow>,
    /// Rows removed because a period cell could not be parsed.
    pub dropped_rows: usize,
}

impl CleanTable {
    pub fn period_index(&self, period: &str) -> Option<usize> {
        self.periods.iter().position(|p| p == period)
    }
}
