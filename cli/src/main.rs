// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Gatekeeper Operator CLI
//!
//! The `gatekeeper-operator` binary drives the operator core in-process.
//!
//! ## Commands
//!
//! - `gatekeeper-operator render --gatekeeper FILE` - Print the manifests a resource produces
//! - `gatekeeper-operator assets --gatekeeper FILE` - Show which catalog assets are selected
//! - `gatekeeper-operator reconcile --gatekeeper FILE [--passes N]` - Reconcile into an in-memory store
//! - `gatekeeper-operator config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use gatekeeper_operator::commands::{
    self, AssetsCommand, ConfigCommand, ReconcileCommand, RenderCommand,
};
use gatekeeper_operator_core::domain::operator_config::{LogFormat, OperatorConfig};

/// Gatekeeper operator - render and reconcile Gatekeeper deployments
#[derive(Parser)]
#[command(name = "gatekeeper-operator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "GATEKEEPER_OPERATOR_CONFIG",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to spec.logging.level
    #[arg(long, global = true, env = "GATEKEEPER_OPERATOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format; defaults to spec.logging.format
    #[arg(long, global = true, value_enum, env = "GATEKEEPER_OPERATOR_LOG_FORMAT")]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render the manifests for a Gatekeeper resource
    #[command(name = "render")]
    Render(RenderCommand),

    /// List catalog assets selected for a Gatekeeper resource
    #[command(name = "assets")]
    Assets(AssetsCommand),

    /// Reconcile a Gatekeeper resource into an in-memory object store
    #[command(name = "reconcile")]
    Reconcile(ReconcileCommand),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file must not stop `config` subcommands from reporting it
    let loaded = OperatorConfig::load_or_default(cli.config.clone());
    let logging = loaded
        .as_ref()
        .map(|config| config.spec.logging.clone())
        .unwrap_or_default();

    init_logging(
        cli.log_level.as_deref().unwrap_or(&logging.level),
        cli.log_format.map(LogFormat::from).unwrap_or(logging.format),
    )?;

    match cli.command {
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Render(command) => {
            commands::render::execute(command, &loaded.context("Failed to load configuration")?).await
        }
        Commands::Assets(command) => {
            commands::assets::execute(command, &loaded.context("Failed to load configuration")?).await
        }
        Commands::Reconcile(command) => {
            commands::reconcile::execute(command, &loaded.context("Failed to load configuration")?)
                .await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
