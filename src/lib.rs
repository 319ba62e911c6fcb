pub mod change;
pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod scatter;
pub mod summary;
pub mod table;

pub use config::{LayoutConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{build_scatter, MetricOutcome, MetricPipeline, WrittenFileInfo};
