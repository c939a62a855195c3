// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use gatekeeper_operator_core::domain::{
    asset::{select_assets, ORDERED_ASSETS},
    operator_config::OperatorConfig,
};

use crate::embedded::read_gatekeeper;

#[derive(Args)]
pub struct AssetsCommand {
    /// Gatekeeper resource manifest
    #[arg(long, value_name = "FILE")]
    pub gatekeeper: PathBuf,
}

/// List the catalog in creation order, marking what the resource selects.
pub async fn execute(command: AssetsCommand, config: &OperatorConfig) -> Result<()> {
    let gatekeeper = read_gatekeeper(&command.gatekeeper)?;
    let platform = config.spec.platform;
    let selected = select_assets(&gatekeeper.spec, platform);

    println!(
        "{} ({} of {}, platform {})",
        "Assets:".bold(),
        selected.len(),
        ORDERED_ASSETS.len(),
        platform
    );

    for (position, asset) in ORDERED_ASSETS.iter().enumerate() {
        let line = format!(
            "{:>3}. {:<32} {}",
            position + 1,
            format!("{:?}", asset.kind()),
            asset.template_path(platform)
        );
        if selected.contains(asset) {
            println!("  {} {}", "✓".green(), line);
        } else {
            println!("  {} {}", "-".dimmed(), line.dimmed());
        }
    }

    Ok(())
}
