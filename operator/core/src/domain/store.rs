// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Collaborator Interfaces
//!
//! Everything the reconciler needs from the outside world goes through the
//! traits in this module, so a pass can run entirely in memory under test.
//!
//! | Trait | Responsibility | Implementations |
//! |-------|----------------|-----------------|
//! | `TemplateLoader` | Load a catalog template by path | `EmbeddedCatalog`, `DirectoryCatalog` |
//! | `ObjectStore` | Get / create / update remote objects | `InMemoryObjectStore` |
//! | `OwnerLinker` | Bind a child's lifecycle to the Gatekeeper resource | `ControllerReferenceLinker` |

use crate::domain::document::{Document, ObjectKey};
use crate::domain::gatekeeper::Gatekeeper;
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// Template catalog
// ============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Template not found in catalog: {0}")]
    NotFound(String),

    #[error("Template {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

pub trait TemplateLoader: Send + Sync {
    /// Load a fresh copy of the template at `path`.
    fn load(&self, path: &str) -> Result<Document, CatalogError>;
}

// ============================================================================
// Remote object store
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(ObjectKey),

    #[error("Object already exists: {0}")]
    AlreadyExists(ObjectKey),

    #[error("Conflict writing {0}: object was modified")]
    Conflict(ObjectKey),

    #[error("Transient store error: {0}")]
    Transient(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote object store, addressed by [`ObjectKey`].
///
/// Each call is a single bounded request; retries and timeouts belong to the
/// caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &ObjectKey) -> Result<Document, StoreError>;

    async fn create(&self, document: &Document) -> Result<(), StoreError>;

    async fn update(&self, document: &Document) -> Result<(), StoreError>;
}

// ============================================================================
// Ownership
// ============================================================================

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("Owner {0} has no uid")]
    MissingUid(String),

    #[error("Object is already controlled by {kind} {name}")]
    AlreadyOwned { kind: String, name: String },

    #[error("Invalid ownerReferences on object: {0}")]
    Invalid(String),
}

pub trait OwnerLinker: Send + Sync {
    /// Record `owner` as the controlling owner of `child`.
    fn set_owner(&self, child: &mut Document, owner: &Gatekeeper) -> Result<(), OwnershipError>;
}
