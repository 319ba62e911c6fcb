// src/pipeline/mod.rs
use rayon::prelude::*;
use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::change::{
    compute_changes, filter_complete, merge::is_complete, merge_sources, select_periods,
    PeriodSelection, ResolvedSelection, SourceRecords,
};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::scatter::{write_scatter, ScatterPoint};
use crate::table::{clean_table, load_raw_table, CleanTable, PeriodLabel, RawTable, SourceKind};

/// Linear progression of a single metric run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    LoadSources,
    Clean,
    SelectColumns,
    ComputeChanges,
    Merge,
    Filter,
    Serialize,
    Done,
}

/// Points for one metric, ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSet {
    pub selection: PeriodSelection,
    pub points: Vec<ScatterPoint>,
    pub city_points: usize,
    pub county_points: usize,
    /// Rows removed by the cleaner across both sources.
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFileInfo {
    pub metric: String,
    pub path: PathBuf,
    pub points: usize,
    pub city_points: usize,
    pub county_points: usize,
    pub dropped_rows: usize,
    pub recent_period: String,
    pub bytes: u64,
}

#[derive(Debug)]
pub struct MetricOutcome {
    pub metric: String,
    pub result: Result<WrittenFileInfo>,
}

/// Clean, select, compute, merge and filter two raw extracts. No I/O.
pub fn build_scatter(metric: &str, city: &RawTable, county: &RawTable) -> Result<ScatterSet> {
    debug!(metric, stage = ?Stage::Clean);
    let tables = [
        (SourceKind::City, clean_table(city)),
        (SourceKind::County, clean_table(county)),
    ];
    let dropped_rows = tables.iter().map(|(_, t)| t.dropped_rows).sum();

    debug!(metric, stage = ?Stage::SelectColumns);
    // both extracts are published together; the city header defines the periods
    let selection = select_periods(&tables[0].1.periods)?;
    warn_if_irregular(metric, &selection);
    let resolved = tables
        .iter()
        .map(|(kind, table)| selection.resolve(table, *kind))
        .collect::<Result<Vec<_>>>()?;
    for ((kind, table), sel) in tables.iter().zip(&resolved) {
        if let Some(latest) = newer_periods_ignored(table, sel) {
            warn!(
                metric,
                source = %kind,
                recent = %selection.recent,
                latest,
                "extract has periods newer than the selected recent period; they are ignored"
            );
        }
    }

    debug!(metric, stage = ?Stage::ComputeChanges);
    let sources: Vec<SourceRecords> = tables
        .iter()
        .zip(&resolved)
        .map(|((kind, table), sel)| SourceRecords {
            kind: *kind,
            records: compute_changes(table, sel),
        })
        .collect();
    let complete_in = |kind: SourceKind| {
        sources
            .iter()
            .filter(|s| s.kind == kind)
            .flat_map(|s| &s.records)
            .filter(|r| is_complete(r))
            .count()
    };
    let city_points = complete_in(SourceKind::City);
    let county_points = complete_in(SourceKind::County);

    debug!(metric, stage = ?Stage::Merge);
    let merged = merge_sources(sources);

    debug!(metric, stage = ?Stage::Filter);
    let points = filter_complete(merged)
        .into_iter()
        .map(ScatterPoint::from)
        .collect();

    Ok(ScatterSet {
        selection,
        points,
        city_points,
        county_points,
        dropped_rows,
    })
}

/// The table's last period when it lies after the resolved recent column.
fn newer_periods_ignored<'a>(table: &'a CleanTable, sel: &ResolvedSelection) -> Option<&'a str> {
    table
        .periods
        .last()
        .filter(|_| sel.recent + 1 < table.periods.len())
        .map(String::as_str)
}

/// Selection is positional; a gap in the published months shows up here first.
fn warn_if_irregular(metric: &str, sel: &PeriodSelection) {
    let parse = |p: &str| PeriodLabel::parse(p);
    if let (Some(recent), Some(previous), Some(year_ago)) =
        (parse(&sel.recent), parse(&sel.previous), parse(&sel.year_ago))
    {
        let mom = recent.months_since(&previous);
        let yoy = recent.months_since(&year_ago);
        if mom != 1 || yoy != 12 {
            warn!(
                metric,
                recent = %sel.recent,
                previous = %sel.previous,
                year_ago = %sel.year_ago,
                "period columns are not consecutive months ({} and {} months apart)",
                mom,
                yoy
            );
        }
    }
}

pub struct MetricPipeline {
    config: PipelineConfig,
}

impl MetricPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub fn run_for_metric(&self, metric: &str) -> Result<WrittenFileInfo> {
        let start = Instant::now();
        debug!(stage = ?Stage::Start);

        debug!(stage = ?Stage::LoadSources);
        let paths = self.config.sources.sources(metric);
        let city = load_raw_table(&paths.city, SourceKind::City)?;
        let county = load_raw_table(&paths.county, SourceKind::County)?;

        let set = build_scatter(metric, &city, &county)?;

        debug!(stage = ?Stage::Serialize);
        let path = self.config.outputs.output_path(metric, &set.selection.recent);
        let bytes = write_scatter(&path, &set.points)?;

        debug!(stage = ?Stage::Done);
        info!(
            points = set.points.len(),
            city = set.city_points,
            county = set.county_points,
            dropped_rows = set.dropped_rows,
            elapsed = ?start.elapsed(),
            "wrote {}",
            path.display()
        );

        Ok(WrittenFileInfo {
            metric: metric.to_string(),
            path,
            points: set.points.len(),
            city_points: set.city_points,
            county_points: set.county_points,
            dropped_rows: set.dropped_rows,
            recent_period: set.selection.recent,
            bytes,
        })
    }

    /// One outcome per metric, in input order. A failure never stops the batch;
    /// `cancel` is checked before each metric starts.
    pub fn run_for_all_metrics(&self, metrics: &[String], cancel: &AtomicBool) -> Vec<MetricOutcome> {
        let run_one = |metric: &String| {
            let result = if cancel.load(Ordering::SeqCst) {
                Err(PipelineError::Cancelled)
            } else {
                self.run_for_metric(metric)
            };
            if let Err(e) = &result {
                let stage = e.stage().map(|s| s.as_str()).unwrap_or("Failed");
                warn!(metric = %metric, stage, "{}", e);
            }
            MetricOutcome {
                metric: metric.clone(),
                result,
            }
        };

        info!(
            metrics = metrics.len(),
            parallel = self.config.parallel,
            "starting batch"
        );
        if self.config.parallel {
            metrics.par_iter().map(run_one).collect()
        } else {
            metrics.iter().map(run_one).collect()
        }
    }

    /// Run every metric named in the config.
    pub fn run_batch(&self, cancel: &AtomicBool) -> Vec<MetricOutcome> {
        self.run_for_all_metrics(&self.config.metrics, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    fn raw(headers: Vec<String>, rows: Vec<Vec<&str>>) -> RawTable {
        RawTable {
            headers,
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    /// Label column then Dec 2023 .. Dec 2024 (13 periods).
    fn headers() -> Vec<String> {
        let mut h = vec!["Location".to_string()];
        h.push("Dec - 2023".to_string());
        h.extend(MONTHS.iter().map(|m| format!("{m} - 2024")));
        h
    }

    fn row<'a>(label: &'a str, year_ago: &'a str, previous: &'a str, recent: &'a str) -> Vec<&'a str> {
        let mut r = vec![label, year_ago];
        r.extend(std::iter::repeat("$1").take(10));
        r.push(previous);
        r.push(recent);
        r
    }

    #[test]
    fn test_build_scatter_merges_city_then_county() {
        let city = raw(
            headers(),
            vec![
                row("Springfield", "$200,000", "$200,000", "$220,000"),
                row("Capital City", "$100", "", "$150"),
            ],
        );
        let county = raw(
            headers(),
            vec![
                row("Springfield", "$400", "$400", "$300"),
                row("Broken", "$1", "oops", "$2"),
                row("Stale", "$1", "$1", ""),
            ],
        );

        let set = build_scatter("median", &city, &county).unwrap();
        assert_eq!(set.selection.recent, "Dec - 2024");
        assert_eq!(set.selection.previous, "Nov - 2024");
        assert_eq!(set.selection.year_ago, "Dec - 2023");
        assert_eq!(set.city_points, 2);
        assert_eq!(set.county_points, 1);
        assert_eq!(set.dropped_rows, 1);

        let labels: Vec<&str> = set.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Springfield", "Capital City", "Springfield"]);

        let springfield = &set.points[0];
        assert_eq!((springfield.x, springfield.y), (10.0, 10.0));
        assert_eq!(springfield.median_value, 220000.0);

        // empty previous cell: sentinel MoM, row kept
        assert_eq!(set.points[1].x, 0.0);
        assert_eq!(set.points[1].y, 50.0);

        assert_eq!(set.points[2].x, -25.0);
    }

    #[test]
    fn test_build_scatter_insufficient_history() {
        let short: Vec<String> = headers().into_iter().take(13).collect();
        let city = raw(short.clone(), vec![]);
        let county = raw(short, vec![]);
        let err = build_scatter("showings", &city, &county).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientHistory { available: 12, required: 13 }
        ));
    }

    #[test]
    fn test_build_scatter_county_missing_selected_period() {
        let city = raw(headers(), vec![]);
        let mut county_headers = headers();
        county_headers.pop();
        let county = raw(county_headers, vec![]);

        let err = build_scatter("inventory", &city, &county).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingPeriod { source_kind: SourceKind::County, .. }
        ));
    }

    #[test]
    fn test_county_with_newer_period_uses_city_selection() {
        let city = raw(headers(), vec![row("Springfield", "$100", "$100", "$110")]);
        let mut county_headers = headers();
        county_headers.push("Jan - 2025".to_string());
        let mut county_row = row("Springfield County", "$200", "$200", "$300");
        county_row.push("$999");
        let county = raw(county_headers, vec![county_row]);

        let city_clean = clean_table(&city);
        let selection = select_periods(&city_clean.periods).unwrap();
        let cleaned = clean_table(&county);
        let sel = selection.resolve(&cleaned, SourceKind::County).unwrap();
        assert_eq!(newer_periods_ignored(&cleaned, &sel), Some("Jan - 2025"));

        let city_sel = selection.resolve(&city_clean, SourceKind::City).unwrap();
        assert_eq!(newer_periods_ignored(&city_clean, &city_sel), None);

        // county values come from Dec 2024, not the trailing Jan 2025 column
        let set = build_scatter("median", &city, &county).unwrap();
        assert_eq!(set.selection.recent, "Dec - 2024");
        assert_eq!(set.points.len(), 2);
        assert_eq!(set.points[1].median_value, 300.0);
        assert_eq!(set.points[1].y, 50.0);
    }
}
