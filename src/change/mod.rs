// src/change/mod.rs
use tracing::trace;

use crate::table::CleanTable;

pub mod merge;
pub mod select;

pub use merge::{filter_complete, merge_sources, SourceRecords};
pub use select::{select_periods, PeriodSelection, ResolvedSelection};

/// Per-location change between the most recent period and its comparison periods.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub location: String,
    pub recent_value: f64,
    pub mom_change_pct: f64,
    pub yoy_change_pct: f64,
}

/// Percentage change from `base` to `current`.
///
/// Missing or zero `base` yields `0.0`, as does any non-finite quotient.
pub fn safe_pct_change(current: f64, base: Option<f64>) -> f64 {
    match base {
        Some(b) if b != 0.0 => {
            let pct = (current - b) / b * 100.0;
            if pct.is_finite() {
                pct
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// One record per row with a recent observation; rows without one are skipped.
pub fn compute_changes(table: &CleanTable, sel: &ResolvedSelection) -> Vec<ChangeRecord> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let cell = |idx: usize| row.cells.get(idx).copied().flatten();

            let Some(recent) = cell(sel.recent) else {
                trace!(location = %row.location, "no recent observation");
                return None;
            };

            Some(ChangeRecord {
                location: row.location.clone(),
                recent_value: recent,
                mom_change_pct: safe_pct_change(recent, cell(sel.previous)),
                yoy_change_pct: safe_pct_change(recent, cell(sel.year_ago)),
            })
        })
        .collect()
}
