use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::Arc};

use crate::layout::{DirectoryLayout, OutputResolver, SourceResolver};

pub const DEFAULT_METRICS: [&str; 6] = [
    "inventory",
    "median",
    "months_supply",
    "new_listings",
    "price_per_foot",
    "showings",
];

/// On-disk settings, read from YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub data_dir: String,
    pub output_dir: String,
    pub metrics: Vec<String>,
    pub city_file: String,
    pub county_file: String,
    pub output_suffix: String,
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            data_dir: "./Data".into(),
            output_dir: "./Data/json/{year}/{month}".into(),
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            city_file: "city.csv".into(),
            county_file: "county.csv".into(),
            output_suffix: "_scatter.json".into(),
            parallel: false,
        }
    }
}

impl LayoutConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing layout config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn layout(&self) -> DirectoryLayout {
        DirectoryLayout {
            data_dir: self.data_dir.clone().into(),
            output_dir: self.output_dir.clone(),
            city_file: self.city_file.clone(),
            county_file: self.county_file.clone(),
            output_suffix: self.output_suffix.clone(),
        }
    }

    pub fn into_pipeline_config(self) -> PipelineConfig {
        let layout = Arc::new(self.layout());
        PipelineConfig {
            metrics: self.metrics,
            sources: layout.clone(),
            outputs: layout,
            parallel: self.parallel,
        }
    }
}

/// Everything the orchestrator needs; no paths are hardcoded below this.
#[derive(Clone)]
pub struct PipelineConfig {
    pub metrics: Vec<String>,
    pub sources: Arc<dyn SourceResolver>,
    pub outputs: Arc<dyn OutputResolver>,
    /// Run metrics on the rayon pool instead of one after another.
    pub parallel: bool,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("metrics", &self.metrics)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_yaml_is_default() -> Result<()> {
        let cfg = LayoutConfig::from_yaml_str("{}")?;
        assert_eq!(cfg, LayoutConfig::default());
        assert_eq!(cfg.metrics.len(), 6);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_overrides() -> Result<()> {
        let cfg = LayoutConfig::from_yaml_str(
            "data_dir: /srv/market\nmetrics: [median, showings]\nparallel: true\n",
        )?;
        assert_eq!(cfg.data_dir, "/srv/market");
        assert_eq!(cfg.metrics, vec!["median", "showings"]);
        assert!(cfg.parallel);
        assert_eq!(cfg.city_file, "city.csv");

        let pipeline = cfg.into_pipeline_config();
        assert_eq!(
            pipeline.sources.sources("median").county,
            PathBuf::from("/srv/market/median/county.csv")
        );
        Ok(())
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(LayoutConfig::from_yaml_str("data_directory: x\n").is_err());
    }
}
