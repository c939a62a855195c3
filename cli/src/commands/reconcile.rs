// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run reconciliation passes against an in-memory object store.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use gatekeeper_operator_core::{
    application::controller::RequestOutcome, domain::operator_config::OperatorConfig,
};

use crate::embedded::{read_gatekeeper, EmbeddedOperator};

#[derive(Args)]
pub struct ReconcileCommand {
    /// Gatekeeper resource manifest
    #[arg(long, value_name = "FILE")]
    pub gatekeeper: PathBuf,

    /// Number of passes to run; later passes show convergence
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub passes: u32,
}

pub async fn execute(command: ReconcileCommand, config: &OperatorConfig) -> Result<()> {
    let gatekeeper = read_gatekeeper(&command.gatekeeper)?;
    let operator = EmbeddedOperator::new(config)?;
    let gatekeeper = operator.submit(&gatekeeper)?;
    let name = gatekeeper.metadata.name.as_str();

    info!(
        "Reconciling '{}' into namespace {} ({} passes)",
        name, config.spec.namespace, command.passes
    );

    for pass in 1..=command.passes {
        match operator.handle(name).await? {
            RequestOutcome::Ignored => {
                println!(
                    "{}",
                    format!("Resource '{}' ignored: only 'gatekeeper' is reconciled", name).yellow()
                );
                return Ok(());
            }
            RequestOutcome::NotFound => {
                println!("{}", format!("Resource '{}' not found", name).yellow());
                return Ok(());
            }
            RequestOutcome::Reconciled(summary) => {
                println!(
                    "{} {} created, {} updated",
                    format!("Pass {}:", pass).bold(),
                    summary.created.len().to_string().green(),
                    summary.updated.len().to_string().cyan()
                );
                for key in &summary.created {
                    println!("  {} {}", "+".green(), key);
                }
                for key in &summary.updated {
                    println!("  {} {}", "~".cyan(), key);
                }
            }
        }
    }

    println!(
        "{}",
        format!("✓ {} objects in store", operator.store().len()).green()
    );
    Ok(())
}
