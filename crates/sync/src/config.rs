use std::path::Path;

use cubes::{DEFAULT_LINKS_PER_NODE, DEFAULT_NODE_SIZE, SetLayout, SizeEncoding};
use data::{DEFAULT_CUBE_WIDTH, NodeColorEncoding};
use foundation::color::{Color, ParseColorError};
use serde::{Deserialize, Serialize};

/// Accepted range of explicit slice counts, node sizes and jitter radii.
pub const SLICE_RANGE: (u8, u8) = (1, 10);
pub const NODE_SIZE_RANGE: (u8, u8) = (1, 10);
pub const JITTER_RANGE: (u8, u8) = (0, 30);

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    OutOfRange { field: &'static str, value: String },
    Color(ParseColorError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "io error: {e}"),
            ConfigError::Parse(e) => write!(f, "parse error: {e}"),
            ConfigError::OutOfRange { field, value } => {
                write!(f, "{field} out of range: {value}")
            }
            ConfigError::Color(e) => write!(f, "background_color: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Map widget state the geo cube projects through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lon: 10.0,
            center_lat: 50.0,
            zoom: 3.0,
        }
    }
}

/// Initial state of a `SyncController`.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub cube_width: f64,
    pub links_per_node: usize,
    /// `None` slices by calendar year.
    pub num_slices: Option<u8>,
    pub jitter: u8,
    pub node_size: u8,
    pub charge_factor: f64,
    pub size_encoding: SizeEncoding,
    pub node_color: NodeColorEncoding,
    pub background_color: String,
    pub set_layout: SetLayout,
    pub hull: bool,
    pub map: MapConfig,
    pub seed: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cube_width: DEFAULT_CUBE_WIDTH,
            links_per_node: DEFAULT_LINKS_PER_NODE,
            num_slices: None,
            jitter: 0,
            node_size: DEFAULT_NODE_SIZE,
            charge_factor: 1.0,
            size_encoding: SizeEncoding::default(),
            node_color: NodeColorEncoding::default(),
            background_color: "#ffffff".to_string(),
            set_layout: SetLayout::default(),
            hull: false,
            map: MapConfig::default(),
            seed: 42,
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cube_width.is_finite() && self.cube_width > 0.0) {
            return Err(out_of_range("cube_width", self.cube_width));
        }
        if let Some(n) = self.num_slices
            && !in_range(n, SLICE_RANGE)
        {
            return Err(out_of_range("num_slices", n));
        }
        if !in_range(self.node_size, NODE_SIZE_RANGE) {
            return Err(out_of_range("node_size", self.node_size));
        }
        if !in_range(self.jitter, JITTER_RANGE) {
            return Err(out_of_range("jitter", self.jitter));
        }
        if !(self.charge_factor.is_finite() && self.charge_factor > 0.0) {
            return Err(out_of_range("charge_factor", self.charge_factor));
        }
        if !(self.map.zoom.is_finite() && (0.0..=22.0).contains(&self.map.zoom)) {
            return Err(out_of_range("map.zoom", self.map.zoom));
        }
        self.background()?;
        Ok(())
    }

    pub fn background(&self) -> Result<Color, ConfigError> {
        Color::parse(&self.background_color).map_err(ConfigError::Color)
    }
}

fn in_range(value: u8, (lo, hi): (u8, u8)) -> bool {
    (lo..=hi).contains(&value)
}

fn out_of_range(field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value: value.to_string(),
    }
}
