//! # heapscope-app - Commands and Presentation
//!
//! Turns command lines into agent calls and agent results into tables.
//!
//! ## Public API
//!
//! ### Commands (`command`, `args`)
//! - [`CommandKind`] - The five heap commands and their usage lines
//! - [`Command`] - A validated command with its params struct
//! - [`UsageError`] - A required positional is missing
//!
//! ### Handlers (`handlers`)
//! - [`handlers::instances`], [`handlers::ivars`], [`handlers::methods`],
//!   [`handlers::execute`], [`handlers::evaluate`]
//! - [`Outcome`] - How a command ended when it did not fail
//!
//! ### Dispatch (`dispatch`, `shell`)
//! - [`Dispatcher`] - Routes short and long command forms to the handlers
//! - [`run_shell`] - The interactive `heapscope>` loop
//!
//! ### Output (`console`, `render`)
//! - [`Console`] - Styled line writer
//! - [`render`] - comfy-table rendering of heap results
//!
//! ### Configuration (`config`)
//! - [`Settings`] - config.toml contents
//! - [`load_settings`], [`resolve_agent_url`]

pub mod args;
pub mod command;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod handlers;
pub mod prompt;
pub mod render;
pub mod shell;

pub use command::{Command, CommandKind, ScriptSource, UsageError};
pub use config::{
    default_config_path, init_config_file, load_settings, resolve_agent_url, AgentSettings,
    Settings, TableStyle, UiSettings,
};
pub use console::Console;
pub use dispatch::{resolve_command, Dispatcher};
pub use handlers::Outcome;
pub use prompt::{NoTerminalPrompt, ScriptPrompt};
pub use shell::{run_shell, tokenize, PROMPT};
