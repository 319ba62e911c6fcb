use tracing::debug;

use super::ChangeRecord;
use crate::table::SourceKind;

/// Change records from one source extract, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecords {
    pub kind: SourceKind,
    pub records: Vec<ChangeRecord>,
}

/// Concatenate sources in the order supplied. Colliding labels are kept as separate records.
pub fn merge_sources(sources: Vec<SourceRecords>) -> Vec<ChangeRecord> {
    let total = sources.iter().map(|s| s.records.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for source in sources {
        debug!(source = %source.kind, records = source.records.len(), "merging");
        merged.extend(source.records);
    }
    merged
}

pub fn is_complete(record: &ChangeRecord) -> bool {
    record.recent_value.is_finite()
        && record.mom_change_pct.is_finite()
        && record.yoy_change_pct.is_finite()
}

/// Keep only records whose numeric fields are all finite, preserving order.
pub fn filter_complete(records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    let before = records.len();
    let kept: Vec<ChangeRecord> = records.into_iter().filter(is_complete).collect();
    if kept.len() != before {
        debug!(dropped = before - kept.len(), "filtered incomplete records");
    }
    kept
}
