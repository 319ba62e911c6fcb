use std::fmt::Write;
use tracing::{error, info, warn};

use crate::pipeline::MetricOutcome;

/// Per-metric success/failure tally for a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[MetricOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    /// Partial success is a normal result and only warns.
    pub fn log(&self) {
        let message = format!(
            "batch complete: {}/{} metrics written, {} failed",
            self.succeeded, self.total, self.failed
        );
        if self.failed == 0 {
            info!("{}", message);
        } else if self.succeeded == 0 {
            error!("{}", message);
        } else {
            warn!("{}", message);
        }
    }
}

/// Fixed-width table, one line per metric.
pub fn render(outcomes: &[MetricOutcome]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{: <18} {: <16} {:>7}  {}", "Metric", "Status", "Points", "Detail");
    let _ = writeln!(out, "{:-<72}", "");
    for o in outcomes {
        let _ = match &o.result {
            Ok(info) => writeln!(
                out,
                "{: <18} {: <16} {:>7}  {} ({})",
                o.metric,
                "ok",
                info.points,
                info.path.display(),
                info.recent_period
            ),
            Err(e) => writeln!(
                out,
                "{: <18} {: <16} {:>7}  {}",
                o.metric,
                e.stage().map(|s| s.as_str()).unwrap_or("failed"),
                "-",
                e
            ),
        };
    }
    out
}
