// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Template catalogs
//!
//! [`EmbeddedCatalog`] serves the manifests compiled into the binary from
//! `operator/core/assets/`. [`DirectoryCatalog`] reads the same layout from
//! disk so a patched catalog can be tried without a rebuild.

use crate::domain::asset::{AssetId, ORDERED_ASSETS};
use crate::domain::document::Document;
use crate::domain::platform::PlatformFlavor;
use crate::domain::store::{CatalogError, TemplateLoader};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

macro_rules! embedded {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_str!(concat!("../../assets/", $path)))),*]
    };
}

const EMBEDDED_TEMPLATES: &[(&str, &str)] = embedded![
    "v1_namespace_gatekeeper-system.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_configs.config.gatekeeper.sh.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_constrainttemplates.templates.gatekeeper.sh.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_constrainttemplatepodstatuses.status.gatekeeper.sh.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_constraintpodstatuses.status.gatekeeper.sh.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_assign.mutations.gatekeeper.sh.yaml",
    "apiextensions.k8s.io_v1beta1_customresourcedefinition_assignmetadata.mutations.gatekeeper.sh.yaml",
    "v1_secret_gatekeeper-webhook-server-cert.yaml",
    "v1_serviceaccount_gatekeeper-admin.yaml",
    "policy_v1beta1_podsecuritypolicy_gatekeeper-admin.yaml",
    "rbac.authorization.k8s.io_v1_clusterrole_gatekeeper-manager-role.yaml",
    "rbac.authorization.k8s.io_v1_clusterrolebinding_gatekeeper-manager-rolebinding.yaml",
    "rbac.authorization.k8s.io_v1_role_gatekeeper-manager-role.yaml",
    "openshift/rbac.authorization.k8s.io_v1_role_gatekeeper-manager-role.yaml",
    "rbac.authorization.k8s.io_v1_rolebinding_gatekeeper-manager-rolebinding.yaml",
    "apps_v1_deployment_gatekeeper-audit.yaml",
    "apps_v1_deployment_gatekeeper-controller-manager.yaml",
    "v1_service_gatekeeper-webhook-service.yaml",
    "admissionregistration.k8s.io_v1beta1_validatingwebhookconfiguration_gatekeeper-validating-webhook-configuration.yaml",
    "admissionregistration.k8s.io_v1beta1_mutatingwebhookconfiguration_gatekeeper-mutating-webhook-configuration.yaml",
];

/// Parse one YAML manifest into a [`Document`].
pub fn parse_template(path: &str, contents: &str) -> Result<Document, CatalogError> {
    let value: Value = serde_yaml::from_str(contents).map_err(|e| CatalogError::Corrupt {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    Document::from_value(value).map_err(|e| CatalogError::Corrupt {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Every catalog path, including platform variants.
pub fn template_paths() -> Vec<String> {
    let mut paths: Vec<String> = ORDERED_ASSETS
        .iter()
        .map(|asset| asset.template_path(PlatformFlavor::Kubernetes).into_owned())
        .collect();
    paths.push(
        AssetId::ManagerRole
            .template_path(PlatformFlavor::OpenShift)
            .into_owned(),
    );
    paths
}

// ============================================================================
// Embedded
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl EmbeddedCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn raw(&self, path: &str) -> Option<&'static str> {
        EMBEDDED_TEMPLATES
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, contents)| *contents)
    }
}

impl TemplateLoader for EmbeddedCatalog {
    fn load(&self, path: &str) -> Result<Document, CatalogError> {
        let contents = self
            .raw(path)
            .ok_or_else(|| CatalogError::NotFound(path.to_string()))?;
        parse_template(path, contents)
    }
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl TemplateLoader for DirectoryCatalog {
    fn load(&self, path: &str) -> Result<Document, CatalogError> {
        // Catalog paths are relative; refuse anything that escapes the root
        if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
            return Err(CatalogError::NotFound(path.to_string()));
        }

        let full_path = self.root.join(path);
        debug!("Reading template {:?}", full_path);

        let contents = match std::fs::read_to_string(&full_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(path.to_string()));
            }
            Err(e) => {
                return Err(CatalogError::Corrupt {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        parse_template(path, &contents)
    }
}
