//! Configuration
//!
//! Session settings with JSON persistence. Unknown or missing fields
//! fall back to defaults so saved configs survive version changes.

use serde::{Deserialize, Serialize};

/// Edge of the page the panel docks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    Top,
    #[default]
    Right,
    Bottom,
    Left,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Open the panel as soon as the session starts
    pub enabled: bool,
    pub panel_position: PanelPosition,
    /// Milliseconds the page must stay quiet before a rescan
    pub rescan_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            panel_position: PanelPosition::default(),
            rescan_debounce_ms: 300,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
