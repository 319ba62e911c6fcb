use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::change::ChangeRecord;
use crate::error::{PipelineError, Result};

/// One point of the chart: x = MoM %, y = YoY %.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    #[serde(rename = "medianValue")]
    pub median_value: f64,
}

impl From<ChangeRecord> for ScatterPoint {
    fn from(r: ChangeRecord) -> Self {
        Self {
            x: r.mom_change_pct,
            y: r.yoy_change_pct,
            label: r.location,
            median_value: r.recent_value,
        }
    }
}

/// Serialize `points` as a 4-space indented JSON array.
pub fn to_json_bytes(points: &[ScatterPoint]) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    points.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Replace the file at `path` with `points`, returning bytes written.
///
/// Writes to a hidden sibling first and renames it over the target, so a failed
/// run never leaves a truncated file behind.
pub fn write_scatter(path: &Path, points: &[ScatterPoint]) -> Result<u64> {
    let failure = |reason: String| PipelineError::SerializationFailure {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = to_json_bytes(points).map_err(|e| failure(format!("serializing JSON: {e}")))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| failure(format!("creating {}: {e}", dir.display())))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| failure("output path has no file name".into()))?;
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let result = (|| -> std::io::Result<()> {
        let mut tmp = BufWriter::new(fs::File::create(&tmp_path)?);
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        drop(tmp);
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(failure(e.to_string()));
    }

    Ok(bytes.len() as u64)
}
