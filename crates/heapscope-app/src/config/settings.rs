//! Settings loader for config.toml

use std::path::{Path, PathBuf};

use heapscope_core::prelude::*;

use super::types::{default_request_timeout_ms, Settings};

const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "heapscope";

/// Environment variable overriding the configured agent URL.
pub const AGENT_URL_ENV_VAR: &str = "HEAPSCOPE_AGENT_URL";

/// `<config_dir>/heapscope/config.toml`, or `None` when the platform has no
/// config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Load settings from `config_path`.
///
/// A missing file yields defaults silently; an unreadable or invalid file
/// yields defaults with a warning in the log.
pub fn load_settings(config_path: &Path) -> Settings {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                validate_settings(settings)
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Replace values that would make every agent call fail.
fn validate_settings(mut settings: Settings) -> Settings {
    if settings.agent.request_timeout_ms == 0 {
        warn!(
            "agent.request_timeout_ms must be greater than 0, using {}",
            default_request_timeout_ms()
        );
        settings.agent.request_timeout_ms = default_request_timeout_ms();
    }
    settings
}

/// Pick the agent URL: command-line flag, then environment, then file.
pub fn resolve_agent_url(cli_url: Option<&str>, settings: &Settings) -> String {
    if let Some(url) = cli_url {
        return url.to_string();
    }

    match std::env::var(AGENT_URL_ENV_VAR) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => settings.agent.url.clone(),
    }
}

/// Write a commented default config file unless one already exists.
///
/// Returns `true` when a file was created.
pub fn init_config_file(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::config(format!("Failed to create {:?}: {}", parent, e)))?;
    }

    let default_content = r#"# heapscope configuration

[agent]
url = "ws://127.0.0.1:27042/heap"   # overridden by --agent or HEAPSCOPE_AGENT_URL
request_timeout_ms = 30000

[ui]
color = true            # --no-color turns this off
table_style = "utf8"    # or "ascii"
"#;

    std::fs::write(config_path, default_content)
        .map_err(|e| Error::config(format!("Failed to write {:?}: {}", config_path, e)))?;
    info!("Created default config at {:?}", config_path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::TableStyle;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_missing_file() {
        let temp = tempdir().unwrap();
        let settings = load_settings(&temp.path().join("config.toml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let config = r#"
[agent]
url = "ws://10.0.0.7:9000/heap"
request_timeout_ms = 500

[ui]
color = false
table_style = "ascii"
"#;
        std::fs::write(&path, config).unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.agent.url, "ws://10.0.0.7:9000/heap");
        assert_eq!(settings.agent.request_timeout_ms, 500);
        assert!(!settings.ui.color);
        assert_eq!(settings.ui.table_style, TableStyle::Ascii);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not valid toml {{{{").unwrap();

        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn test_load_settings_zero_timeout_uses_default() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[agent]\nrequest_timeout_ms = 0\n").unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.agent.request_timeout_ms, 30_000);
        assert!(!settings.agent.request_timeout().is_zero());
    }

    #[test]
    fn test_init_config_file_round_trips_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        assert!(init_config_file(&path).unwrap());
        assert!(!init_config_file(&path).unwrap());
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    #[serial]
    fn test_resolve_agent_url_priority() {
        let mut settings = Settings::default();
        settings.agent.url = "ws://file:1/heap".to_string();

        std::env::remove_var(AGENT_URL_ENV_VAR);
        assert_eq!(resolve_agent_url(None, &settings), "ws://file:1/heap");

        std::env::set_var(AGENT_URL_ENV_VAR, "ws://env:2/heap");
        assert_eq!(resolve_agent_url(None, &settings), "ws://env:2/heap");
        assert_eq!(
            resolve_agent_url(Some("ws://flag:3/heap"), &settings),
            "ws://flag:3/heap"
        );

        std::env::remove_var(AGENT_URL_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_resolve_agent_url_ignores_blank_env() {
        std::env::set_var(AGENT_URL_ENV_VAR, "   ");
        assert_eq!(
            resolve_agent_url(None, &Settings::default()),
            crate::config::types::DEFAULT_AGENT_URL
        );
        std::env::remove_var(AGENT_URL_ENV_VAR);
    }
}
