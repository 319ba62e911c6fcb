use std::path::PathBuf;
use thiserror::Error;

use crate::table::SourceKind;

/// Number of period columns needed to look one year back from the most recent one.
pub const REQUIRED_PERIODS: usize = 13;

/// Where a metric run stopped when it did not reach `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailedStage {
    LoadFailed,
    ColumnsFailed,
    SerializeFailed,
    Cancelled,
}

impl FailedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedStage::LoadFailed => "LoadFailed",
            FailedStage::ColumnsFailed => "ColumnsFailed",
            FailedStage::SerializeFailed => "SerializeFailed",
            FailedStage::Cancelled => "Cancelled",
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{source_kind} source {path:?} unreadable: {reason}")]
    SourceUnreadable {
        source_kind: SourceKind,
        path: PathBuf,
        reason: String,
    },

    #[error("insufficient history: {available} period columns, need {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("{source_kind} table has no column `{period}`")]
    MissingPeriod {
        source_kind: SourceKind,
        period: String,
    },

    /// Row-level; the cleaner drops the row and logs this, it never aborts a metric.
    #[error("malformed cell for `{location}` in `{column}`: {value:?}")]
    MalformedCell {
        location: String,
        column: String,
        value: String,
    },

    #[error("failed to write {path:?}: {reason}")]
    SerializationFailure { path: PathBuf, reason: String },

    #[error("cancelled before start")]
    Cancelled,
}

impl PipelineError {
    /// Terminal state this error puts a metric run into.
    ///
    /// `MalformedCell` maps to `None`: it is recovered inside the run.
    pub fn stage(&self) -> Option<FailedStage> {
        match self {
            PipelineError::SourceUnreadable { .. } => Some(FailedStage::LoadFailed),
            PipelineError::InsufficientHistory { .. } | PipelineError::MissingPeriod { .. } => {
                Some(FailedStage::ColumnsFailed)
            }
            PipelineError::SerializationFailure { .. } => Some(FailedStage::SerializeFailed),
            PipelineError::Cancelled => Some(FailedStage::Cancelled),
            PipelineError::MalformedCell { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
