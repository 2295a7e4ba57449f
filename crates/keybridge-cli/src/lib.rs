//! keybridge command-line interface.
//!
//! A credential helper: the calling tool picks a verb, passes the request
//! on stdin and reads the answer from stdout. [`client`] is the other end
//! of that conversation.

pub mod client;
pub mod protocol;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keybridge_core::config::Backend;
use keybridge_core::{paths, Config};

/// keybridge - store registry credentials in the OS secure store
#[derive(Parser)]
#[command(name = "keybridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (logs go to stderr)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "KEYBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Secure store backend (auto, native, keyring, pass, memory)
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Helper verbs
#[derive(Subcommand)]
pub enum Commands {
    /// Store credentials read as JSON from stdin
    Store,

    /// Print the credentials for the server URL read from stdin
    Get,

    /// Remove the credentials for the server URL read from stdin
    Erase,

    /// Print all stored server URLs and their usernames
    List,

    /// Show version information
    Version,
}

/// Resolve configuration from the config file, environment and flags.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli
        .config
        .as_ref()
        .map(|p| paths::expand_tilde(&p.to_string_lossy()));
    let mut config = Config::resolve(path.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    Ok(config)
}

/// `tracing` filter directive for the configured level, raised by `-v`.
pub fn log_directive(level: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("keybridge={level}")
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("keybridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let bridge = keybridge_store::open_bridge(&config.store)?;
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    match cli.command {
        Commands::Store => protocol::store(bridge.as_ref(), stdin)?,
        Commands::Get => protocol::get(bridge.as_ref(), stdin, stdout)?,
        Commands::Erase => protocol::erase(bridge.as_ref(), stdin)?,
        Commands::List => protocol::list(bridge.as_ref(), stdout)?,
        Commands::Version => {}
    }
    Ok(())
}
