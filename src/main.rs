#![deny(clippy::mod_module_files)]
use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use checkout_snapshot::{
    client::{resolve_client_dir, ClientDirectory},
    config::ToolConfig,
};

mod commands;

/// Inspect and update the SNAPSHOT file of a checkout
#[derive(Debug, Parser)]
#[command(name = "checkout-snapshot", version)]
struct Cli {
    /// Client directory holding the SNAPSHOT file
    #[arg(long)]
    client_dir: Option<PathBuf>,

    /// Mount path, resolved through the state directory's config.json
    /// unless --client-dir is given
    #[arg(long)]
    mount: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the recorded checkout state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Mark a checkout from one revision to another as started
    Begin { from: String, to: String },
    /// Record a finished checkout of a revision
    Complete { commit: String },
    /// Move the working copy parent without touching the checkout
    SetParent { commit: String },
    /// Show repository settings from the checkout's config.toml
    Info,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CHECKOUT_SNAPSHOT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ToolConfig::load()?;
    let client = resolve_client(&cli, &config)?;
    tracing::debug!("using client directory {:?}", client.client_dir());

    let store = client.state_store(config.retry_policy());
    let mut stdout = io::stdout();

    match &cli.command {
        Command::Status { json } => commands::status::handle(&store, &mut stdout, *json),
        Command::Begin { from, to } => commands::begin::handle(&store, &mut stdout, from, to),
        Command::Complete { commit } => commands::complete::handle(&store, &mut stdout, commit),
        Command::SetParent { commit } => {
            commands::set_parent::handle(&store, &mut stdout, commit)
        }
        Command::Info => commands::info::handle(&client, &mut stdout),
    }
}

fn resolve_client(cli: &Cli, config: &ToolConfig) -> Result<ClientDirectory> {
    match (&cli.client_dir, &cli.mount) {
        (Some(client_dir), mount) => Ok(ClientDirectory::new(
            mount.as_ref().unwrap_or(client_dir),
            client_dir,
        )),
        (None, Some(mount)) => {
            let client_dir = resolve_client_dir(&config.state_dir, mount)?;
            Ok(ClientDirectory::new(mount, client_dir))
        }
        (None, None) => anyhow::bail!("one of --client-dir or --mount is required"),
    }
}
