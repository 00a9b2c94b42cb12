//! heapscope library
//!
//! Start-up and wiring: logging, configuration, the agent connection, and
//! either a single command or the interactive shell.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use heapscope_agent::{AgentClient, ConnectOptions};
use heapscope_app::{
    default_config_path, init_config_file, load_settings, resolve_agent_url, run_shell, Console,
    Dispatcher, NoTerminalPrompt, ScriptPrompt,
};
use heapscope_core::prelude::*;
use heapscope_tui::TerminalScriptPrompt;

/// Start-up options from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub agent_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub no_color: bool,
    /// Tokens of a one-shot command; empty starts the shell
    pub command: Vec<String>,
}

/// The config file to use: `--config` or the platform default.
pub fn config_path(options: &RunOptions) -> Result<PathBuf> {
    match &options.config_path {
        Some(path) => Ok(path.clone()),
        None => default_config_path()
            .ok_or_else(|| Error::config("no config directory on this platform")),
    }
}

/// Write a default config file. Returns `false` if one already exists.
pub fn init_config(path: &Path) -> Result<bool> {
    init_config_file(path)
}

/// Connect to the agent and run the requested command or the shell.
///
/// A `--config` path that does not exist is an error; a missing file at the
/// default location just means default settings.
pub async fn run(options: RunOptions) -> Result<()> {
    heapscope_core::logging::init()?;

    let settings = match (&options.config_path, config_path(&options)) {
        (Some(_), Ok(path)) if !path.exists() => {
            return Err(Error::ConfigNotFound { path });
        }
        (_, Ok(path)) => load_settings(&path),
        (_, Err(e)) => {
            warn!("{}; using default settings", e);
            Default::default()
        }
    };

    let mut ui = settings.ui.clone();
    if options.no_color {
        ui.color = false;
    }

    let url = resolve_agent_url(options.agent_url.as_deref(), &settings);

    let client = AgentClient::connect(
        &url,
        ConnectOptions {
            request_timeout: settings.agent.request_timeout(),
        },
    )
    .await
    .with_context(|| format!("Connecting to agent at {url}"))?;

    let mut dispatcher = Dispatcher::new(client.handle(), script_prompt(), Console::stdout(&ui));

    let result = if options.command.is_empty() {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        run_shell(&mut dispatcher, stdin).await
    } else {
        dispatcher.dispatch(&options.command).await.map(|outcome| {
            debug!("Command finished: {:?}", outcome);
        })
    };

    if let Err(ref e) = result {
        error!("Command failed: {:?}", e);
    }

    client.close().await;
    info!("heapscope exiting");
    result
}

/// The inline editor when attached to a terminal, otherwise a prompt that
/// points the operator at `--inline`.
fn script_prompt() -> Box<dyn ScriptPrompt> {
    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        Box::new(TerminalScriptPrompt)
    } else {
        Box::new(NoTerminalPrompt)
    }
}
