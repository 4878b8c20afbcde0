// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! eb - Environment Broker CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod completions;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{operation, status, work, Context};
use error::CliError;
use eb_core::BrokerConfig;
use output::OutputFormat;
use std::path::PathBuf;

/// Environment variable naming the config file when `--config` is absent
const CONFIG_ENV: &str = "EB_CONFIG";

#[derive(Parser)]
#[command(
    name = "eb",
    version,
    about = "eb - provision and track environment instances"
)]
struct Cli {
    /// Config file (defaults to $EB_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State directory, overriding the config file
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a provision operation for an instance
    Provision(operation::ProvisionArgs),
    /// Queue a deprovision operation for an instance
    Deprovision {
        /// Instance ID
        instance: String,
    },
    /// Queue an update operation for an instance
    Update(operation::ProvisionArgs),
    /// Show the last durable state of an operation
    Status {
        /// Operation ID
        operation: String,
    },
    /// List an instance's operations, oldest first
    List {
        /// Instance ID
        instance: String,
    },
    /// Show an operation's audit trail
    Events {
        /// Operation ID
        operation: String,
    },
    /// Abandon a running operation so the ones queued behind it can start
    Supersede {
        /// Operation ID
        operation: String,
        /// Reason recorded on the operation
        #[arg(long, default_value = "superseded by operator")]
        reason: String,
    },
    /// List enabled plans
    Plans,
    /// Run workers in this process
    Work(work::WorkArgs),
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        match e.downcast_ref::<CliError>() {
            Some(err) => eprint!("{}", err),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Completions need no config
    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions::<Cli>(shell);
        return Ok(());
    }

    setup_logging();

    let config_path = cli
        .config
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let mut config = BrokerConfig::load(config_path.as_deref())?;
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }
    let ctx = Context::new(config, cli.output);

    match cli.command {
        Commands::Provision(args) => operation::provision(&ctx, args)?,
        Commands::Deprovision { instance } => operation::deprovision(&ctx, &instance)?,
        Commands::Update(args) => operation::update(&ctx, args)?,
        Commands::Supersede { operation, reason } => {
            operation::supersede(&ctx, &operation, &reason)?
        }
        Commands::Status { operation } => status::status(&ctx, &operation)?,
        Commands::List { instance } => status::list(&ctx, &instance)?,
        Commands::Events { operation } => status::events(&ctx, &operation)?,
        Commands::Plans => status::plans(&ctx)?,
        Commands::Work(args) => work::work(&ctx, args).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Log to stderr so stdout stays parseable
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
