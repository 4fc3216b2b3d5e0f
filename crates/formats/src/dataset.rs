//! Typed ingestion of spreadsheet-style rows.
//!
//! Key properties:
//! - Input is a JSON array of flat objects (or `{"rows": [...]}`) whose cells
//!   are strings, numbers or null, the way a sheet export delivers them.
//! - `target_nodes` and `label` are delimited lists (`,` `;` or `|`).
//! - Empty coordinates load as NaN; the geo cube skips such records.
//! - Row order is preserved; duplicate ids are rejected.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use data::{CATEGORY_COUNT, Record, RecordId};
use serde_json::{Map, Value};
use tracing::{debug, info};

const LIST_DELIMITERS: [char; 3] = [',', ';', '|'];

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NotARowList,
    MissingField { row: usize, field: &'static str },
    InvalidDate { row: usize, value: String },
    InvalidNumber { row: usize, field: &'static str, value: String },
    InvalidId { row: usize, value: String },
    DuplicateId { row: usize, id: RecordId },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "io error: {e}"),
            DatasetError::Json(e) => write!(f, "json error: {e}"),
            DatasetError::NotARowList => write!(f, "expected an array of rows"),
            DatasetError::MissingField { row, field } => {
                write!(f, "row {row}: missing {field}")
            }
            DatasetError::InvalidDate { row, value } => {
                write!(f, "row {row}: invalid date_time {value:?}")
            }
            DatasetError::InvalidNumber { row, field, value } => {
                write!(f, "row {row}: invalid {field} {value:?}")
            }
            DatasetError::InvalidId { row, value } => write!(f, "row {row}: invalid id {value:?}"),
            DatasetError::DuplicateId { row, id } => write!(f, "row {row}: duplicate id {id}"),
        }
    }
}

impl std::error::Error for DatasetError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path).map_err(DatasetError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_str(payload).map_err(DatasetError::Json)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, DatasetError> {
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(obj) => obj
                .get("rows")
                .and_then(Value::as_array)
                .ok_or(DatasetError::NotARowList)?,
            _ => return Err(DatasetError::NotARowList),
        };

        let mut seen = HashSet::with_capacity(rows.len());
        let mut records = Vec::with_capacity(rows.len());
        let mut unlocated = 0usize;
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_object().ok_or(DatasetError::NotARowList)?;
            let record = parse_row(row, cells)?;
            if !seen.insert(record.id) {
                return Err(DatasetError::DuplicateId { row, id: record.id });
            }
            if !(record.longitude.is_finite() && record.latitude.is_finite()) {
                unlocated += 1;
            }
            records.push(record);
        }
        if unlocated > 0 {
            debug!(unlocated, "rows without coordinates");
        }
        info!(rows = records.len(), "dataset parsed");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

fn parse_row(row: usize, cells: &Map<String, Value>) -> Result<Record, DatasetError> {
    let id_text = cell_text(cells, "id").ok_or(DatasetError::MissingField { row, field: "id" })?;
    let id = parse_id(&id_text).ok_or(DatasetError::InvalidId { row, value: id_text })?;

    let date_text = cell_text(cells, "date_time").ok_or(DatasetError::MissingField {
        row,
        field: "date_time",
    })?;
    let date_time = parse_date_time(&date_text).ok_or(DatasetError::InvalidDate {
        row,
        value: date_text,
    })?;

    let mut record = Record::new(id, date_time)
        .with_location(
            parse_coordinate(row, cells, "longitude")?,
            parse_coordinate(row, cells, "latitude")?,
        )
        .with_targets(parse_targets(row, cells)?)
        .with_labels(split_list(&cell_text(cells, "label").unwrap_or_default()));

    for n in 1..=CATEGORY_COUNT {
        let key = format!("category_{n}");
        if let Some(value) = cell_text(cells, &key) {
            record.set_category(n, value);
        }
    }
    Ok(record)
}

/// Cell contents as trimmed text; `None` for absent, null or blank cells.
fn cell_text(cells: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match cells.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Accepts `"12"` and integral floats such as `"12.0"` (sheet exports do that).
fn parse_id(text: &str) -> Option<RecordId> {
    if let Ok(id) = text.parse::<u32>() {
        return Some(RecordId(id));
    }
    let f = text.parse::<f64>().ok()?;
    (f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64).then(|| RecordId(f as u32))
}

pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    // Bare year.
    if text.len() == 4 {
        let year = text.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    None
}

fn parse_coordinate(
    row: usize,
    cells: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, DatasetError> {
    let Some(text) = cell_text(cells, field) else {
        return Ok(f64::NAN);
    };
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(DatasetError::InvalidNumber {
            row,
            field,
            value: text,
        })
}

fn parse_targets(row: usize, cells: &Map<String, Value>) -> Result<Vec<RecordId>, DatasetError> {
    let raw = match cells.get("target_nodes") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => split_list(&cell_text(cells, "target_nodes").unwrap_or_default()),
    };
    raw.into_iter()
        .map(|token| parse_id(&token).ok_or(DatasetError::InvalidId { row, value: token }))
        .collect()
}

fn split_list(text: &str) -> Vec<String> {
    text.split(LIST_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
