use std::collections::HashMap;
use std::path::Path;

use data::RecordId;
use foundation::math::Vec2;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::dataset::DatasetError;

#[derive(Debug, Deserialize)]
struct PositionEntry {
    id: Value,
    x: f64,
    y: f64,
}

/// Reads externally computed node positions.
///
/// Accepts either `[{"id": 1, "x": .., "y": ..}, ..]` or `{"1": [x, y], ..}`.
/// Non-finite positions are dropped.
pub fn layout_positions_from_json_str(
    payload: &str,
) -> Result<HashMap<RecordId, Vec2>, DatasetError> {
    let value: Value = serde_json::from_str(payload).map_err(DatasetError::Json)?;
    let mut out = HashMap::new();
    match value {
        Value::Array(_) => {
            let entries: Vec<PositionEntry> =
                serde_json::from_value(value).map_err(DatasetError::Json)?;
            for (row, entry) in entries.into_iter().enumerate() {
                let id = id_of(row, &entry.id)?;
                out.insert(id, Vec2::new(entry.x, entry.y));
            }
        }
        Value::Object(map) => {
            for (row, (key, pair)) in map.into_iter().enumerate() {
                let id = id_of(row, &Value::String(key))?;
                let [x, y]: [f64; 2] = serde_json::from_value(pair).map_err(DatasetError::Json)?;
                out.insert(id, Vec2::new(x, y));
            }
        }
        _ => return Err(DatasetError::NotARowList),
    }
    let before = out.len();
    out.retain(|_, p| p.x.is_finite() && p.y.is_finite());
    debug!(positions = out.len(), dropped = before - out.len(), "layout parsed");
    Ok(out)
}

pub fn load_layout_positions(
    path: impl AsRef<Path>,
) -> Result<HashMap<RecordId, Vec2>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(DatasetError::Io)?;
    layout_positions_from_json_str(&text)
}

fn id_of(row: usize, value: &Value) -> Result<RecordId, DatasetError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    text.parse::<u32>()
        .map(RecordId)
        .map_err(|_| DatasetError::InvalidId { row, value: text })
}
