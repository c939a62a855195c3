// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use gatekeeper_operator_core::domain::operator_config::{
    CatalogSource, OperatorConfig, ENV_CONFIG_PATH, ENV_NAMESPACE, ENV_PLATFORM,
};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./gatekeeper-operator.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = OperatorConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            ENV_CONFIG_PATH,
            std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./gatekeeper-operator.yaml");
        println!("  4. ~/.gatekeeper-operator/config.yaml");
        println!("  5. /etc/gatekeeper-operator/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Deployment:".bold());
    println!("  Namespace: {}", config.spec.namespace);
    println!("  Platform: {}", config.spec.platform);
    for var in [ENV_NAMESPACE, ENV_PLATFORM] {
        if let Ok(value) = std::env::var(var) {
            println!("  {} {}={}", "env".dimmed(), var, value);
        }
    }
    println!();

    println!("{}", "Template catalog:".bold());
    match config.spec.catalog.source {
        CatalogSource::Embedded => println!("  Source: embedded"),
        CatalogSource::Directory => println!(
            "  Source: directory ({})",
            config
                .spec
                .catalog
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no path)".to_string())
        ),
    }
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);
    println!("  Format: {:?}", config.spec.logging.format);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OperatorConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    if with_examples {
        std::fs::write(&output, include_str!("../../templates/operator-config.yaml"))
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    } else {
        OperatorConfig::default()
            .to_yaml_file(&output)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    }

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generated_configs_validate() {
        let dir = tempfile::tempdir().unwrap();
        for examples in [false, true] {
            let path = dir.path().join(format!("config-{examples}.yaml"));
            generate(path.clone(), examples).await.unwrap();

            let config = OperatorConfig::from_yaml_file(&path).unwrap();
            config.validate().unwrap();
        }
    }
}
