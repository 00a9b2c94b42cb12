//! heapscope - inspect live Objective-C heap objects through an agent
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;

/// heapscope - inspect live heap objects in an instrumented process
#[derive(Parser, Debug)]
#[command(name = "heapscope")]
#[command(
    about = "Inspect live Objective-C heap objects through an injected agent",
    long_about = None
)]
struct Args {
    /// Agent WebSocket URL (overrides HEAPSCOPE_AGENT_URL and the config file)
    #[arg(long, value_name = "URL")]
    agent: Option<String>,

    /// Path to config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable styled output
    #[arg(long)]
    no_color: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Command to run once; starts the interactive shell when omitted
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let options = heapscope::RunOptions {
        agent_url: args.agent,
        config_path: args.config,
        no_color: args.no_color,
        command: args.command,
    };

    if args.init_config {
        let path = heapscope::config_path(&options)?;
        if heapscope::init_config(&path)? {
            eprintln!("Created {}", path.display());
        } else {
            eprintln!("{} already exists", path.display());
        }
        return Ok(());
    }

    heapscope::run(options).await?;
    Ok(())
}
