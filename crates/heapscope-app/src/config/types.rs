//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default agent endpoint, matching the agent's listener.
pub const DEFAULT_AGENT_URL: &str = "ws://127.0.0.1:27042/heap";

/// Settings from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// WebSocket endpoint of the instrumentation agent
    #[serde(default = "default_agent_url")]
    pub url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            url: default_agent_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl AgentSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_agent_url() -> String {
    DEFAULT_AGENT_URL.to_string()
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Styled terminal output (bold usage lines, yellow warnings, colored headers)
    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default)]
    pub table_style: TableStyle,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            color: true,
            table_style: TableStyle::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Border characters used for result tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    #[default]
    Utf8,
    Ascii,
}

impl std::fmt::Display for TableStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStyle::Utf8 => write!(f, "utf8"),
            TableStyle::Ascii => write!(f, "ascii"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.agent.url, DEFAULT_AGENT_URL);
        assert_eq!(settings.agent.request_timeout(), Duration::from_secs(30));
        assert!(settings.ui.color);
        assert_eq!(settings.ui.table_style, TableStyle::Utf8);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = toml::from_str("[ui]\ntable_style = \"ascii\"\n").unwrap();
        assert_eq!(settings.ui.table_style, TableStyle::Ascii);
        assert!(settings.ui.color);
        assert_eq!(settings.agent, AgentSettings::default());
    }

    #[test]
    fn test_unknown_table_style_rejected() {
        let result: std::result::Result<Settings, _> =
            toml::from_str("[ui]\ntable_style = \"fancy\"\n");
        assert!(result.is_err());
    }
}
