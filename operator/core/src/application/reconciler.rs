// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reconciler
//!
//! One pass walks the selected assets in catalog order:
//!
//! 1. load the template
//! 2. apply overrides
//! 3. link ownership to the Gatekeeper resource
//! 4. get the remote object: create when absent, retain cluster fields and
//!    update when present
//!
//! The pass is sequential and stops at the first failure. Nothing is rolled
//! back; the caller re-runs the pass, which is safe because every step is
//! idempotent. There are no internal retries and no caching.

use crate::application::overrides::{apply_overrides, OverrideContext};
use crate::application::retention::retain_cluster_fields;
use crate::domain::asset::{select_assets, AssetId};
use crate::domain::document::{ObjectKey, SchemaError};
use crate::domain::gatekeeper::Gatekeeper;
use crate::domain::platform::PlatformDetector;
use crate::domain::store::{
    CatalogError, ObjectStore, OwnerLinker, OwnershipError, StoreError, TemplateLoader,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to load template for {asset}: {source}")]
    Catalog {
        asset: AssetId,
        #[source]
        source: CatalogError,
    },

    #[error("Template for {asset} does not match expected schema{}: {source}", key_suffix(.key))]
    Schema {
        asset: AssetId,
        key: Option<ObjectKey>,
        #[source]
        source: SchemaError,
    },

    #[error("Remote store failure for {asset} ({key}): {source}")]
    Remote {
        asset: AssetId,
        key: ObjectKey,
        #[source]
        source: StoreError,
    },

    #[error("Failed to link {asset} ({key}) to its owner: {source}")]
    Ownership {
        asset: AssetId,
        key: ObjectKey,
        #[source]
        source: OwnershipError,
    },
}

fn key_suffix(key: &Option<ObjectKey>) -> String {
    key.as_ref().map(|k| format!(" ({k})")).unwrap_or_default()
}

impl ReconcileError {
    /// Only remote failures go away by running the pass again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub fn asset(&self) -> AssetId {
        match self {
            Self::Catalog { asset, .. }
            | Self::Schema { asset, .. }
            | Self::Remote { asset, .. }
            | Self::Ownership { asset, .. } => *asset,
        }
    }

    pub fn key(&self) -> Option<&ObjectKey> {
        match self {
            Self::Catalog { .. } => None,
            Self::Schema { key, .. } => key.as_ref(),
            Self::Remote { key, .. } | Self::Ownership { key, .. } => Some(key),
        }
    }
}

/// Remote objects written by one pass, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: Vec<ObjectKey>,
    pub updated: Vec<ObjectKey>,
}

impl ReconcileSummary {
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

pub struct GatekeeperReconciler {
    loader: Arc<dyn TemplateLoader>,
    store: Arc<dyn ObjectStore>,
    owner_linker: Arc<dyn OwnerLinker>,
    platform: Arc<dyn PlatformDetector>,
    namespace: String,
}

impl GatekeeperReconciler {
    pub fn new(
        loader: Arc<dyn TemplateLoader>,
        store: Arc<dyn ObjectStore>,
        owner_linker: Arc<dyn OwnerLinker>,
        platform: Arc<dyn PlatformDetector>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            store,
            owner_linker,
            platform,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn reconcile(&self, gatekeeper: &Gatekeeper) -> Result<ReconcileSummary, ReconcileError> {
        let platform = self.platform.current_flavor();
        let assets = select_assets(&gatekeeper.spec, platform);
        let ctx = OverrideContext {
            spec: &gatekeeper.spec,
            namespace: &self.namespace,
            platform,
        };

        info!(
            "Reconciling {} '{}' ({} assets, platform {}, namespace {})",
            gatekeeper.kind,
            gatekeeper.metadata.name,
            assets.len(),
            platform,
            self.namespace
        );

        let mut summary = ReconcileSummary::default();
        for asset in assets {
            self.reconcile_asset(asset, gatekeeper, &ctx, &mut summary).await?;
        }

        info!(
            "Reconciled '{}': {} created, {} updated",
            gatekeeper.metadata.name,
            summary.created.len(),
            summary.updated.len()
        );
        Ok(summary)
    }

    async fn reconcile_asset(
        &self,
        asset: AssetId,
        gatekeeper: &Gatekeeper,
        ctx: &OverrideContext<'_>,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ReconcileError> {
        let path = asset.template_path(ctx.platform);
        debug!("Loading template {}", path);

        let mut document = self
            .loader
            .load(&path)
            .map_err(|source| ReconcileError::Catalog { asset, source })?;

        apply_overrides(asset, &mut document, ctx).map_err(|source| ReconcileError::Schema {
            asset,
            key: document.key().ok(),
            source,
        })?;

        let key = document.key().map_err(|source| ReconcileError::Schema {
            asset,
            key: None,
            source,
        })?;

        self.owner_linker
            .set_owner(&mut document, gatekeeper)
            .map_err(|source| ReconcileError::Ownership {
                asset,
                key: key.clone(),
                source,
            })?;

        match self.store.get(&key).await {
            Err(StoreError::NotFound(_)) => {
                self.store
                    .create(&document)
                    .await
                    .map_err(|source| remote(asset, &key, source))?;
                info!(asset = %asset, "Created {}", key);
                summary.created.push(key);
            }
            Ok(observed) => {
                retain_cluster_fields(&mut document, &observed).map_err(|source| {
                    ReconcileError::Schema {
                        asset,
                        key: Some(key.clone()),
                        source,
                    }
                })?;
                self.store
                    .update(&document)
                    .await
                    .map_err(|source| remote(asset, &key, source))?;
                info!(asset = %asset, "Updated {}", key);
                summary.updated.push(key);
            }
            Err(source) => return Err(remote(asset, &key, source)),
        }

        Ok(())
    }
}

fn remote(asset: AssetId, key: &ObjectKey, source: StoreError) -> ReconcileError {
    ReconcileError::Remote {
        asset,
        key: key.clone(),
        source,
    }
}
