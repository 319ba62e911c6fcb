use anyhow::{Context, Result};
use glob::glob;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::table::PeriodLabel;

/// Paths of the two extracts a metric is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSources {
    pub city: PathBuf,
    pub county: PathBuf,
}

pub trait SourceResolver: Send + Sync {
    fn sources(&self, metric: &str) -> MetricSources;
}

pub trait OutputResolver: Send + Sync {
    /// `recent_period` is the identifier of the most recent column in the metric's data.
    fn output_path(&self, metric: &str, recent_period: &str) -> PathBuf;
}

/// `<data_dir>/<metric>/{city,county}.csv` in, `<output_dir>/<metric>_scatter.json` out.
///
/// `output_dir` may carry `{year}` and `{month}`; they are filled from the
/// metric's most recent period, e.g. `Data/json/{year}/{month}` becomes
/// `Data/json/2024/December`.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub data_dir: PathBuf,
    pub output_dir: String,
    pub city_file: String,
    pub county_file: String,
    pub output_suffix: String,
}

impl DirectoryLayout {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            city_file: "city.csv".into(),
            county_file: "county.csv".into(),
            output_suffix: "_scatter.json".into(),
        }
    }

    /// Metric names with a city extract under `data_dir`, sorted.
    pub fn discover_metrics(&self) -> Result<Vec<String>> {
        let pattern = self.data_dir.join("*").join(&self.city_file);
        let pattern = pattern.to_string_lossy();

        let mut found = BTreeSet::new();
        for entry in glob(&pattern).with_context(|| format!("bad glob pattern '{}'", pattern))? {
            let path = entry.context("reading data directory")?;
            if let Some(metric) = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
            {
                found.insert(metric.to_string());
            }
        }
        debug!(count = found.len(), data_dir = %self.data_dir.display(), "discovered metrics");
        Ok(found.into_iter().collect())
    }

    fn expand_output_dir(&self, recent_period: &str) -> PathBuf {
        let (year, month) = match PeriodLabel::parse(recent_period) {
            Some(p) => (p.year().to_string(), p.month_name()),
            None => ("unknown".to_string(), "unknown".to_string()),
        };
        PathBuf::from(
            self.output_dir
                .replace("{year}", &year)
                .replace("{month}", &month),
        )
    }
}

impl SourceResolver for DirectoryLayout {
    fn sources(&self, metric: &str) -> MetricSources {
        let dir = self.data_dir.join(metric);
        MetricSources {
            city: dir.join(&self.city_file),
            county: dir.join(&self.county_file),
        }
    }
}

impl OutputResolver for DirectoryLayout {
    fn output_path(&self, metric: &str, recent_period: &str) -> PathBuf {
        self.expand_output_dir(recent_period)
            .join(format!("{}{}", metric, self.output_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sources_and_output_paths() {
        let layout = DirectoryLayout::new("Data", "Data/json/{year}/{month}");
        assert_eq!(
            layout.sources("median"),
            MetricSources {
                city: PathBuf::from("Data/median/city.csv"),
                county: PathBuf::from("Data/median/county.csv"),
            }
        );
        assert_eq!(
            layout.output_path("median", "Dec - 2024"),
            PathBuf::from("Data/json/2024/December/median_scatter.json")
        );
        assert_eq!(
            layout.output_path("showings", "Latest"),
            PathBuf::from("Data/json/unknown/unknown/showings_scatter.json")
        );
    }

    #[test]
    fn test_output_path_from_full_month_name() {
        let layout = DirectoryLayout::new("Data", "Data/json/{year}/{month}");
        assert_eq!(
            layout.output_path("median", "December - 2024"),
            PathBuf::from("Data/json/2024/December/median_scatter.json")
        );
    }

    #[test]
    fn test_output_dir_without_placeholders() {
        let layout = DirectoryLayout::new("Data", "out");
        assert_eq!(
            layout.output_path("inventory", "Dec - 2024"),
            PathBuf::from("out/inventory_scatter.json")
        );
    }

    #[test]
    fn test_discover_metrics() -> Result<()> {
        let dir = tempdir()?;
        for metric in ["showings", "inventory", "median"] {
            fs::create_dir_all(dir.path().join(metric))?;
        }
        fs::write(dir.path().join("showings/city.csv"), "Location\n")?;
        fs::write(dir.path().join("inventory/city.csv"), "Location\n")?;
        // no city extract: not a metric
        fs::write(dir.path().join("median/county.csv"), "Location\n")?;

        let layout = DirectoryLayout::new(dir.path(), "out");
        assert_eq!(layout.discover_metrics()?, vec!["inventory", "showings"]);
        Ok(())
    }
}
