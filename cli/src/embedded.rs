// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded operator
//!
//! Wires the core collaborators in-process from an [`OperatorConfig`]: the
//! configured template catalog, an in-memory object store, controller owner
//! references and the configured platform.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use gatekeeper_operator_core::{
    application::{
        controller::{GatekeeperController, RequestOutcome},
        reconciler::GatekeeperReconciler,
    },
    domain::{
        document::Document,
        gatekeeper::Gatekeeper,
        operator_config::{CatalogSource, OperatorConfig},
        platform::StaticPlatform,
        store::TemplateLoader,
    },
    infrastructure::{
        catalog::{DirectoryCatalog, EmbeddedCatalog},
        memory_store::InMemoryObjectStore,
        owner::ControllerReferenceLinker,
    },
};

/// Build the template loader selected by `spec.catalog`.
pub fn template_loader(config: &OperatorConfig) -> Result<Arc<dyn TemplateLoader>> {
    match config.spec.catalog.source {
        CatalogSource::Embedded => Ok(Arc::new(EmbeddedCatalog::new())),
        CatalogSource::Directory => {
            let root = config
                .spec
                .catalog
                .path
                .clone()
                .context("spec.catalog.path is required for a directory catalog")?;
            tracing::debug!("Using template directory {:?}", root);
            Ok(Arc::new(DirectoryCatalog::new(root)))
        }
    }
}

/// Read a `Gatekeeper` resource from a YAML file.
pub fn read_gatekeeper(path: &Path) -> Result<Gatekeeper> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read Gatekeeper resource {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse Gatekeeper resource {:?}", path))
}

pub struct EmbeddedOperator {
    store: Arc<InMemoryObjectStore>,
    controller: GatekeeperController,
}

impl EmbeddedOperator {
    pub fn new(config: &OperatorConfig) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let store = Arc::new(InMemoryObjectStore::new());
        let reconciler = GatekeeperReconciler::new(
            template_loader(config)?,
            store.clone(),
            Arc::new(ControllerReferenceLinker::new()),
            Arc::new(StaticPlatform(config.spec.platform)),
            config.spec.namespace.clone(),
        );
        let controller = GatekeeperController::new(store.clone(), reconciler);

        Ok(Self { store, controller })
    }

    pub fn store(&self) -> &InMemoryObjectStore {
        &self.store
    }

    /// Store `gatekeeper` the way the API server would, assigning a uid when
    /// the manifest has none. Returns the stored resource.
    pub fn submit(&self, gatekeeper: &Gatekeeper) -> Result<Gatekeeper> {
        let mut gatekeeper = gatekeeper.clone();
        if gatekeeper.metadata.uid.is_none() {
            gatekeeper.metadata.uid = Some(Uuid::new_v4().to_string());
        }

        let value = serde_json::to_value(&gatekeeper).context("Failed to encode Gatekeeper")?;
        let document = Document::from_value(value).context("Failed to encode Gatekeeper")?;
        self.store
            .insert(document)
            .context("Failed to store Gatekeeper")?;

        Ok(gatekeeper)
    }

    /// Handle one reconciliation request. The store's call log only covers
    /// the latest request.
    pub async fn handle(&self, name: &str) -> Result<RequestOutcome> {
        self.store.clear_calls();
        self.controller
            .handle(name)
            .await
            .with_context(|| format!("Reconciliation request for '{}' failed", name))
    }
}
