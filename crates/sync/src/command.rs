use cubes::{CubeKind, Layout, RecordFilter, SetLayout, SizeEncoding, TimeMode};
use data::{NodeColorEncoding, RecordId};
use serde::{Deserialize, Serialize};

/// One message from the control panel. Each present key is applied on its own.
///
/// Ordering contract:
/// - Keys are applied in declaration order, so `numSlices` rebuilds slices
///   before any per-point style in the same message is applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_slices: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_size: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_color: Option<NodeColorEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_layout: Option<SetLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hull: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_encoding: Option<SizeEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_factor: Option<f64>,
}

impl StyleCommand {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn num_slices(n: u8) -> Self {
        Self {
            num_slices: Some(n),
            ..Self::default()
        }
    }

    pub fn node_size(n: u8) -> Self {
        Self {
            node_size: Some(n),
            ..Self::default()
        }
    }

    pub fn jitter(radius: u8) -> Self {
        Self {
            jitter: Some(radius),
            ..Self::default()
        }
    }
}

/// What the controller broadcast, recorded on its trace bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load { records: usize },
    Style(StyleCommand),
    Filter(RecordFilter),
    Highlight(Option<RecordId>),
    Time(TimeMode),
    Transition(Layout),
    Visibility { view: CubeKind, visible: bool },
}

#[cfg(test)]
mod tests {
    use super::StyleCommand;
    use cubes::SetLayout;
    use data::NodeColorEncoding;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_control_panel_keys() {
        let cmd = StyleCommand::from_json_str(
            r##"{ "numSlices": 4, "nodeColor": "temporal", "sLayout": "category_grid",
                 "backgroundColor": "#000000", "hull": true }"##,
        )
        .expect("parse");
        assert_eq!(
            cmd,
            StyleCommand {
                num_slices: Some(4),
                background_color: Some("#000000".to_string()),
                node_color: Some(NodeColorEncoding::Temporal),
                s_layout: Some(SetLayout::CategoryGrid),
                hull: Some(true),
                ..StyleCommand::default()
            }
        );
    }

    #[test]
    fn serializes_only_present_keys() {
        let json = serde_json::to_string(&StyleCommand::jitter(12)).expect("serialize");
        assert_eq!(json, r#"{"jitter":12}"#);
        assert!(StyleCommand::default().is_empty());
        assert!(!StyleCommand::node_size(2).is_empty());
    }

    #[test]
    fn rejects_unknown_encodings() {
        assert!(StyleCommand::from_json_str(r#"{ "nodeColor": "rainbow" }"#).is_err());
    }
}
