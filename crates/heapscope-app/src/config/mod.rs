//! Configuration file parsing for heapscope
//!
//! Supports:
//! - `<config_dir>/heapscope/config.toml` - agent endpoint and UI settings
//! - `HEAPSCOPE_AGENT_URL` - agent endpoint override

pub mod settings;
pub mod types;

pub use settings::{
    default_config_path, init_config_file, load_settings, resolve_agent_url, AGENT_URL_ENV_VAR,
};
pub use types::*;
