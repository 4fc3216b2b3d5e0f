//! Headless session helpers behind the `stc` binary.

use std::path::Path;

use chrono::NaiveDateTime;
use cubes::{Layout, RecordFilter, TimeMode};
use data::RecordId;
use formats::{Dataset, load_layout_positions, parse_date_time};
use sync::{StyleCommand, SyncConfig, SyncController};
use tracing::info;

/// Where a session's inputs come from.
#[derive(Debug, Clone, Default)]
pub struct SessionSource<'a> {
    pub config: Option<&'a Path>,
    pub data: Option<&'a Path>,
    pub layout: Option<&'a Path>,
}

/// Builds a controller and loads the dataset into it.
pub fn open_session(source: &SessionSource<'_>) -> Result<SyncController, String> {
    let config = match source.config {
        Some(path) => {
            SyncConfig::load(path).map_err(|e| format!("config {}: {e}", path.display()))?
        }
        None => SyncConfig::default(),
    };
    let mut controller = SyncController::new(config).map_err(|e| format!("config: {e}"))?;

    let records = match source.data {
        Some(path) => Dataset::load(path)
            .map_err(|e| format!("dataset {}: {e}", path.display()))?
            .into_records(),
        None => Vec::new(),
    };
    let layout = match source.layout {
        Some(path) => {
            load_layout_positions(path).map_err(|e| format!("layout {}: {e}", path.display()))?
        }
        None => Default::default(),
    };
    info!(records = records.len(), positions = layout.len(), "session inputs read");
    controller.load(records, layout);
    Ok(controller)
}

pub fn parse_bound(text: &str) -> Result<NaiveDateTime, String> {
    parse_date_time(text).ok_or_else(|| format!("invalid date: {text:?}"))
}

pub fn parse_time_mode(text: &str) -> Result<TimeMode, String> {
    match text.trim() {
        "aggregated" => Ok(TimeMode::Aggregated),
        "absolute" => Ok(TimeMode::Absolute),
        other => Err(format!("unknown time mode: {other:?} (aggregated|absolute)")),
    }
}

pub fn parse_layout(text: &str) -> Result<Layout, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "stc" | "stacked" => Ok(Layout::Stacked),
        "jp" | "juxtaposed" => Ok(Layout::Juxtaposed),
        "si" | "superimposed" => Ok(Layout::Superimposed),
        "ani" | "animated" => Ok(Layout::Animated),
        other => Err(format!("unknown layout: {other:?} (stc|jp|si|ani)")),
    }
}

/// Comma-separated layouts, e.g. `stc,si,jp`.
pub fn parse_sequence(text: &str) -> Result<Vec<Layout>, String> {
    text.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_layout)
        .collect()
}

/// Filter from optional CLI pieces; `None` when nothing was given.
pub fn filter_from_args(
    category: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<RecordFilter>, String> {
    if category.is_none() && start.is_none() && end.is_none() {
        return Ok(None);
    }
    Ok(Some(RecordFilter::new(
        category.unwrap_or_default(),
        start.map(parse_bound).transpose()?,
        end.map(parse_bound).transpose()?,
    )))
}

pub fn style_from_json(text: &str) -> Result<StyleCommand, String> {
    StyleCommand::from_json_str(text).map_err(|e| format!("style: {e}"))
}

pub fn parse_record_id(text: &str) -> Result<RecordId, String> {
    text.trim()
        .parse::<u32>()
        .map(RecordId)
        .map_err(|_| format!("invalid record id: {text:?}"))
}

/// Runs `sequence` on `controller`, holding each layout for `hold_s` seconds.
pub fn simulate(
    controller: &mut SyncController,
    sequence: &[Layout],
    hold_s: f64,
    fps: u32,
) -> u64 {
    let dt = 1.0 / f64::from(fps.max(1));
    let mut frames = 0;
    for layout in sequence {
        controller.transition(*layout);
        frames += controller.run_for(hold_s, dt);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::{
        SessionSource, filter_from_args, open_session, parse_layout, parse_sequence,
        parse_time_mode, simulate,
    };
    use cubes::{Layout, TimeMode};
    use pretty_assertions::assert_eq;
    use sync::Summary;

    fn temp_dir(label: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("stc_tools_{label}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn parses_layouts_and_modes() {
        assert_eq!(
            parse_sequence("stc, SI,jp").expect("sequence"),
            vec![Layout::Stacked, Layout::Superimposed, Layout::Juxtaposed]
        );
        assert!(parse_layout("cube").is_err());
        assert_eq!(parse_time_mode("absolute"), Ok(TimeMode::Absolute));
        assert!(parse_time_mode("relative").is_err());
    }

    #[test]
    fn filter_needs_at_least_one_piece() {
        assert_eq!(filter_from_args(None, None, None), Ok(None));
        let filter = filter_from_args(Some("navy"), Some("1940"), None)
            .expect("filter")
            .expect("some");
        assert_eq!(filter.category, "navy");
        assert!(filter.start.is_some());
        assert!(filter_from_args(None, Some("someday"), None).is_err());
    }

    #[test]
    fn session_from_files_runs_a_sequence() {
        let dir = temp_dir("session");
        let data = dir.join("data.json");
        let layout = dir.join("layout.json");
        std::fs::write(
            &data,
            r#"[
                { "id": 1, "date_time": "1940-01-01", "longitude": 10, "latitude": 50, "target_nodes": "2" },
                { "id": 2, "date_time": "1942-01-01", "longitude": 11, "latitude": 51 }
            ]"#,
        )
        .expect("write data");
        std::fs::write(&layout, r#"{ "1": [0, 0], "2": [1, 1] }"#).expect("write layout");

        let source = SessionSource {
            config: None,
            data: Some(data.as_path()),
            layout: Some(layout.as_path()),
        };
        let mut controller = open_session(&source).expect("session");
        let frames = simulate(&mut controller, &[Layout::Superimposed], 5.0, 10);
        assert_eq!(frames, 50);

        let summary = Summary::of(&controller);
        assert_eq!(summary.records, 2);
        assert!(summary.views.iter().all(|v| v.layout == Layout::Superimposed));
        assert!(
            summary.views[0]
                .slice_positions
                .iter()
                .all(|p| p[1] == -250.0)
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dataset_is_reported() {
        let source = SessionSource {
            data: Some(std::path::Path::new("/nonexistent/stc/data.json")),
            ..SessionSource::default()
        };
        let err = open_session(&source).err().expect("error");
        assert!(err.starts_with("dataset /nonexistent/stc/data.json"));
    }
}
