// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gatekeeper controller
//!
//! Front door for change notifications on `Gatekeeper` resources. Filters the
//! events that warrant a pass, fetches the current resource and hands it to
//! the [`GatekeeperReconciler`].

use crate::application::reconciler::{GatekeeperReconciler, ReconcileError, ReconcileSummary};
use crate::domain::document::ObjectKey;
use crate::domain::gatekeeper::{
    Gatekeeper, DEFAULT_GATEKEEPER_NAME, GATEKEEPER_API_VERSION, GATEKEEPER_KIND,
};
use crate::domain::store::{ObjectStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Change notification for a watched `Gatekeeper` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Created,
    Updated {
        old_generation: i64,
        new_generation: i64,
    },
    Deleted,
    Generic,
}

/// Metadata and status updates leave the generation alone and are skipped.
/// Deletion is handled by owner-reference garbage collection.
pub fn should_reconcile(event: &ChangeEvent) -> bool {
    match event {
        ChangeEvent::Created | ChangeEvent::Generic => true,
        ChangeEvent::Updated {
            old_generation,
            new_generation,
        } => old_generation != new_generation,
        ChangeEvent::Deleted => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Resource name is not the one the operator manages.
    Ignored,
    /// Resource is gone; nothing to converge.
    NotFound,
    Reconciled(ReconcileSummary),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Failed to fetch Gatekeeper '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Gatekeeper '{name}' could not be decoded: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl ControllerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => !source.is_not_found(),
            Self::Decode { .. } => false,
            Self::Reconcile(e) => e.is_retryable(),
        }
    }
}

pub struct GatekeeperController {
    store: Arc<dyn ObjectStore>,
    reconciler: GatekeeperReconciler,
}

impl GatekeeperController {
    pub fn new(store: Arc<dyn ObjectStore>, reconciler: GatekeeperReconciler) -> Self {
        Self { store, reconciler }
    }

    pub fn gatekeeper_key(name: &str) -> ObjectKey {
        ObjectKey::cluster_scoped(GATEKEEPER_API_VERSION, GATEKEEPER_KIND, name)
    }

    /// Handle one request for the `Gatekeeper` resource called `name`.
    pub async fn handle(&self, name: &str) -> Result<RequestOutcome, ControllerError> {
        if name != DEFAULT_GATEKEEPER_NAME {
            warn!(
                "Gatekeeper resource name '{}' is not supported, only '{}' is reconciled",
                name, DEFAULT_GATEKEEPER_NAME
            );
            return Ok(RequestOutcome::Ignored);
        }

        let document = match self.store.get(&Self::gatekeeper_key(name)).await {
            Ok(document) => document,
            Err(StoreError::NotFound(_)) => {
                info!("Gatekeeper '{}' not found, nothing to reconcile", name);
                return Ok(RequestOutcome::NotFound);
            }
            Err(source) => {
                return Err(ControllerError::Fetch {
                    name: name.to_string(),
                    source,
                })
            }
        };

        let gatekeeper: Gatekeeper =
            serde_json::from_value(document.into_value()).map_err(|source| {
                ControllerError::Decode {
                    name: name.to_string(),
                    source,
                }
            })?;

        match self.reconciler.reconcile(&gatekeeper).await {
            Ok(summary) => Ok(RequestOutcome::Reconciled(summary)),
            Err(e) => {
                error!(
                    asset = %e.asset(),
                    retryable = e.is_retryable(),
                    "Reconciliation of '{}' failed: {}",
                    name,
                    e
                );
                Err(e.into())
            }
        }
    }
}
