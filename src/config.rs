use crate::filter::EmptySelectionPolicy;
use crate::types::Indicator;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    pub geojson: PathBuf,
    #[serde(default = "default_district_property")]
    pub district_property: String,
    /// Optional feature property holding a display name for the district.
    pub name_property: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Falls back to the latest year in the dataset when unset.
    pub default_year: Option<i32>,
    #[serde(default)]
    pub default_indicator: Indicator,
    #[serde(default)]
    pub empty_districts: EmptySelectionPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    #[serde(default = "default_map_style")]
    pub style: String,
    #[serde(default = "default_center")]
    pub center: [f64; 2], // [lat, lon]
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default = "default_color_stops")]
    pub color_stops: Vec<String>, // Hex codes, low to high
    #[serde(default = "default_no_data_color")]
    pub no_data_color: String,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

fn default_district_property() -> String {
    "DISTRICT_CODE".to_string()
}

fn default_map_style() -> String {
    "carto-positron".to_string()
}

fn default_center() -> [f64; 2] {
    [48.210033, 16.363449]
}

fn default_zoom() -> f64 {
    9.5
}

// Viridis
fn default_color_stops() -> Vec<String> {
    ["#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58", "#b5de2b", "#fde725"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_no_data_color() -> String {
    "#d3d3d3".to_string()
}

fn default_highlight_color() -> String {
    "#e4572e".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_max_sessions() -> u64 {
    10_000
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_year: None,
            default_indicator: Indicator::default(),
            empty_districts: EmptySelectionPolicy::default(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: default_map_style(),
            center: default_center(),
            zoom: default_zoom(),
            color_stops: default_color_stops(),
            no_data_color: default_no_data_color(),
            highlight_color: default_highlight_color(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
