// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Render the manifests a Gatekeeper resource produces, without touching any
//! object store.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use gatekeeper_operator_core::{
    application::overrides::{apply_overrides, OverrideContext},
    domain::{
        asset::select_assets, document::Document, gatekeeper::Gatekeeper,
        operator_config::OperatorConfig, store::TemplateLoader,
    },
};

use crate::embedded::{read_gatekeeper, template_loader};

#[derive(Args)]
pub struct RenderCommand {
    /// Gatekeeper resource manifest
    #[arg(long, value_name = "FILE")]
    pub gatekeeper: PathBuf,

    /// Write the rendered manifests here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub async fn execute(command: RenderCommand, config: &OperatorConfig) -> Result<()> {
    let gatekeeper = read_gatekeeper(&command.gatekeeper)?;
    let loader = template_loader(config)?;
    let documents = render(&gatekeeper, config, loader.as_ref())?;
    let stream = to_yaml_stream(&documents)?;

    match command.output {
        Some(path) => {
            std::fs::write(&path, stream)
                .with_context(|| format!("Failed to write manifests to {:?}", path))?;
            eprintln!(
                "{}",
                format!("✓ Rendered {} manifests to {}", documents.len(), path.display()).green()
            );
        }
        None => print!("{}", stream),
    }

    Ok(())
}

/// Load and override every selected asset for `gatekeeper`, in creation order.
pub fn render(
    gatekeeper: &Gatekeeper,
    config: &OperatorConfig,
    loader: &dyn TemplateLoader,
) -> Result<Vec<Document>> {
    let platform = config.spec.platform;
    let ctx = OverrideContext {
        spec: &gatekeeper.spec,
        namespace: &config.spec.namespace,
        platform,
    };

    select_assets(&gatekeeper.spec, platform)
        .into_iter()
        .map(|asset| {
            let mut document = loader
                .load(&asset.template_path(platform))
                .with_context(|| format!("Failed to load template for {}", asset))?;
            apply_overrides(asset, &mut document, &ctx)
                .with_context(|| format!("Failed to apply overrides to {}", asset))?;
            Ok(document)
        })
        .collect()
}

/// Multi-document YAML, `---` separated.
pub fn to_yaml_stream(documents: &[Document]) -> Result<String> {
    let mut stream = String::new();
    for document in documents {
        stream.push_str("---\n");
        stream.push_str(&serde_yaml::to_string(document).context("Failed to encode manifest")?);
    }
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeeper_operator_core::domain::platform::PlatformFlavor;
    use gatekeeper_operator_core::infrastructure::catalog::EmbeddedCatalog;

    fn gatekeeper(yaml: &str) -> Gatekeeper {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_render_default_resource() {
        let gk = gatekeeper("apiVersion: operator.gatekeeper.sh/v1alpha1\nkind: Gatekeeper\nmetadata:\n  name: gatekeeper\n");
        let docs = render(&gk, &OperatorConfig::default(), &EmbeddedCatalog::new()).unwrap();

        assert_eq!(docs.len(), 15);
        assert_eq!(docs[0].kind(), Some("CustomResourceDefinition"));
        assert!(docs.iter().all(|d| d.get_path(&["metadata", "ownerReferences"]).is_none()));
    }

    #[test]
    fn test_render_openshift_namespace() {
        let gk = gatekeeper("apiVersion: operator.gatekeeper.sh/v1alpha1\nkind: Gatekeeper\nmetadata:\n  name: gatekeeper\n");
        let mut config = OperatorConfig::default();
        config.spec.platform = PlatformFlavor::OpenShift;
        config.spec.namespace = "opa".to_string();

        let docs = render(&gk, &config, &EmbeddedCatalog::new()).unwrap();
        assert_eq!(docs[0].kind(), Some("Namespace"));
        assert_eq!(docs[0].name(), Some("opa"));
    }

    #[test]
    fn test_yaml_stream_round_trips() {
        let gk = gatekeeper("apiVersion: operator.gatekeeper.sh/v1alpha1\nkind: Gatekeeper\nmetadata:\n  name: gatekeeper\n");
        let docs = render(&gk, &OperatorConfig::default(), &EmbeddedCatalog::new()).unwrap();
        let stream = to_yaml_stream(&docs).unwrap();

        assert_eq!(stream.matches("---\n").count(), docs.len());
        assert!(stream.contains("name: gatekeeper-audit"));
    }
}
