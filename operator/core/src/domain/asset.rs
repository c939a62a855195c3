// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Asset Catalog & Selector
//!
//! The fixed catalog of Gatekeeper manifests the operator manages, in creation
//! order, and the selection logic that drops entries for disabled features.
//!
//! # Ordering
//!
//! [`ORDERED_ASSETS`] encodes creation dependencies: the namespace comes before
//! anything living in it, CRDs before their instances, the server-cert secret
//! before the deployment mounting it. Selection only ever removes entries; it
//! never reorders or duplicates them.

use crate::domain::gatekeeper::GatekeeperSpec;
use crate::domain::platform::PlatformFlavor;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Directory holding platform-specific template variants.
pub const OPENSHIFT_ASSETS_DIR: &str = "openshift/";

/// Stable identifier of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetId {
    Namespace,
    ConfigCrd,
    ConstraintTemplateCrd,
    ConstraintTemplatePodStatusCrd,
    ConstraintPodStatusCrd,
    AssignCrd,
    AssignMetadataCrd,
    WebhookServerCertSecret,
    AdminServiceAccount,
    AdminPodSecurityPolicy,
    ManagerClusterRole,
    ManagerClusterRoleBinding,
    ManagerRole,
    ManagerRoleBinding,
    AuditDeployment,
    WebhookDeployment,
    WebhookService,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
}

/// Canonical creation order of every asset.
pub const ORDERED_ASSETS: [AssetId; 19] = [
    AssetId::Namespace,
    AssetId::ConfigCrd,
    AssetId::ConstraintTemplateCrd,
    AssetId::ConstraintTemplatePodStatusCrd,
    AssetId::ConstraintPodStatusCrd,
    AssetId::AssignCrd,
    AssetId::AssignMetadataCrd,
    AssetId::WebhookServerCertSecret,
    AssetId::AdminServiceAccount,
    AssetId::AdminPodSecurityPolicy,
    AssetId::ManagerClusterRole,
    AssetId::ManagerClusterRoleBinding,
    AssetId::ManagerRole,
    AssetId::ManagerRoleBinding,
    AssetId::AuditDeployment,
    AssetId::WebhookDeployment,
    AssetId::WebhookService,
    AssetId::ValidatingWebhookConfiguration,
    AssetId::MutatingWebhookConfiguration,
];

/// Assets that only exist while mutating webhooks are enabled.
pub const MUTATING_ASSETS: [AssetId; 3] = [
    AssetId::AssignCrd,
    AssetId::AssignMetadataCrd,
    AssetId::MutatingWebhookConfiguration,
];

/// Kind of an asset; decides which override rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Namespace,
    CustomResourceDefinition,
    AuditDeployment,
    WebhookDeployment,
    ClusterRole,
    ClusterRoleBinding,
    Role,
    RoleBinding,
    Secret,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
    Other,
}

impl AssetId {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Namespace => AssetKind::Namespace,
            Self::ConfigCrd
            | Self::ConstraintTemplateCrd
            | Self::ConstraintTemplatePodStatusCrd
            | Self::ConstraintPodStatusCrd
            | Self::AssignCrd
            | Self::AssignMetadataCrd => AssetKind::CustomResourceDefinition,
            Self::WebhookServerCertSecret => AssetKind::Secret,
            Self::AdminServiceAccount | Self::AdminPodSecurityPolicy | Self::WebhookService => {
                AssetKind::Other
            }
            Self::ManagerClusterRole => AssetKind::ClusterRole,
            Self::ManagerClusterRoleBinding => AssetKind::ClusterRoleBinding,
            Self::ManagerRole => AssetKind::Role,
            Self::ManagerRoleBinding => AssetKind::RoleBinding,
            Self::AuditDeployment => AssetKind::AuditDeployment,
            Self::WebhookDeployment => AssetKind::WebhookDeployment,
            Self::ValidatingWebhookConfiguration => AssetKind::ValidatingWebhookConfiguration,
            Self::MutatingWebhookConfiguration => AssetKind::MutatingWebhookConfiguration,
        }
    }

    /// Template file name inside the catalog.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Namespace => "v1_namespace_gatekeeper-system.yaml",
            Self::ConfigCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_configs.config.gatekeeper.sh.yaml"
            }
            Self::ConstraintTemplateCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_constrainttemplates.templates.gatekeeper.sh.yaml"
            }
            Self::ConstraintTemplatePodStatusCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_constrainttemplatepodstatuses.status.gatekeeper.sh.yaml"
            }
            Self::ConstraintPodStatusCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_constraintpodstatuses.status.gatekeeper.sh.yaml"
            }
            Self::AssignCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_assign.mutations.gatekeeper.sh.yaml"
            }
            Self::AssignMetadataCrd => {
                "apiextensions.k8s.io_v1beta1_customresourcedefinition_assignmetadata.mutations.gatekeeper.sh.yaml"
            }
            Self::WebhookServerCertSecret => "v1_secret_gatekeeper-webhook-server-cert.yaml",
            Self::AdminServiceAccount => "v1_serviceaccount_gatekeeper-admin.yaml",
            Self::AdminPodSecurityPolicy => "policy_v1beta1_podsecuritypolicy_gatekeeper-admin.yaml",
            Self::ManagerClusterRole => {
                "rbac.authorization.k8s.io_v1_clusterrole_gatekeeper-manager-role.yaml"
            }
            Self::ManagerClusterRoleBinding => {
                "rbac.authorization.k8s.io_v1_clusterrolebinding_gatekeeper-manager-rolebinding.yaml"
            }
            Self::ManagerRole => "rbac.authorization.k8s.io_v1_role_gatekeeper-manager-role.yaml",
            Self::ManagerRoleBinding => {
                "rbac.authorization.k8s.io_v1_rolebinding_gatekeeper-manager-rolebinding.yaml"
            }
            Self::AuditDeployment => "apps_v1_deployment_gatekeeper-audit.yaml",
            Self::WebhookDeployment => "apps_v1_deployment_gatekeeper-controller-manager.yaml",
            Self::WebhookService => "v1_service_gatekeeper-webhook-service.yaml",
            Self::ValidatingWebhookConfiguration => {
                "admissionregistration.k8s.io_v1beta1_validatingwebhookconfiguration_gatekeeper-validating-webhook-configuration.yaml"
            }
            Self::MutatingWebhookConfiguration => {
                "admissionregistration.k8s.io_v1beta1_mutatingwebhookconfiguration_gatekeeper-mutating-webhook-configuration.yaml"
            }
        }
    }

    /// Catalog path for the given platform. The role has an OpenShift variant
    /// that keeps the same identity and position.
    pub fn template_path(&self, platform: PlatformFlavor) -> Cow<'static, str> {
        match (self, platform) {
            (Self::ManagerRole, PlatformFlavor::OpenShift) => {
                Cow::Owned(format!("{}{}", OPENSHIFT_ASSETS_DIR, self.file_name()))
            }
            _ => Cow::Borrowed(self.file_name()),
        }
    }

    pub fn is_mutating(&self) -> bool {
        MUTATING_ASSETS.contains(self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Select the assets to reconcile for `spec` on `platform`, in creation order.
///
/// - validating webhook disabled: drops the validating webhook configuration
/// - mutating webhook disabled: drops the mutation CRDs and the mutating
///   webhook configuration
/// - Kubernetes: drops the namespace, which is the operator's own and already
///   exists
pub fn select_assets(spec: &GatekeeperSpec, platform: PlatformFlavor) -> Vec<AssetId> {
    let validating = spec.validating_webhook_enabled();
    let mutating = spec.mutating_webhook_enabled();

    ORDERED_ASSETS
        .iter()
        .copied()
        .filter(|asset| match asset {
            AssetId::Namespace => platform.is_openshift(),
            AssetId::ValidatingWebhookConfiguration => validating,
            a if a.is_mutating() => mutating,
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gatekeeper::Mode;

    fn spec(validating: Option<Mode>, mutating: Option<Mode>) -> GatekeeperSpec {
        GatekeeperSpec {
            validating_webhook: validating,
            mutating_webhook: mutating,
            ..GatekeeperSpec::default()
        }
    }

    fn is_subsequence(selected: &[AssetId]) -> bool {
        let mut canonical = ORDERED_ASSETS.iter();
        selected.iter().all(|a| canonical.any(|c| c == a))
    }

    #[test]
    fn test_default_selection_on_kubernetes() {
        let selected = select_assets(&GatekeeperSpec::default(), PlatformFlavor::Kubernetes);
        assert!(!selected.contains(&AssetId::Namespace));
        assert!(selected.contains(&AssetId::ValidatingWebhookConfiguration));
        for asset in MUTATING_ASSETS {
            assert!(!selected.contains(&asset));
        }
        assert_eq!(selected.len(), ORDERED_ASSETS.len() - 4);
    }

    #[test]
    fn test_namespace_kept_on_openshift() {
        let selected = select_assets(&GatekeeperSpec::default(), PlatformFlavor::OpenShift);
        assert_eq!(selected.first(), Some(&AssetId::Namespace));
    }

    #[test]
    fn test_mutating_disabled_removes_exactly_mutation_assets() {
        let enabled = select_assets(&spec(None, Some(Mode::Enabled)), PlatformFlavor::OpenShift);
        let disabled = select_assets(&spec(None, Some(Mode::Disabled)), PlatformFlavor::OpenShift);

        assert_eq!(enabled, ORDERED_ASSETS.to_vec());
        let removed: Vec<_> = enabled.iter().filter(|a| !disabled.contains(a)).copied().collect();
        assert_eq!(removed, MUTATING_ASSETS.to_vec());
    }

    #[test]
    fn test_validating_disabled_removes_only_validating_config() {
        let base = select_assets(&spec(None, None), PlatformFlavor::Kubernetes);
        let selected = select_assets(&spec(Some(Mode::Disabled), None), PlatformFlavor::Kubernetes);

        let removed: Vec<_> = base.iter().filter(|a| !selected.contains(a)).copied().collect();
        assert_eq!(removed, vec![AssetId::ValidatingWebhookConfiguration]);
    }

    #[test]
    fn test_every_combination_preserves_order() {
        let modes = [None, Some(Mode::Enabled), Some(Mode::Disabled)];
        for platform in [PlatformFlavor::Kubernetes, PlatformFlavor::OpenShift] {
            for validating in modes {
                for mutating in modes {
                    let selected = select_assets(&spec(validating, mutating), platform);
                    assert!(!selected.is_empty());
                    assert!(is_subsequence(&selected), "{:?}", selected);
                }
            }
        }
    }

    #[test]
    fn test_role_template_path() {
        assert_eq!(
            AssetId::ManagerRole.template_path(PlatformFlavor::OpenShift),
            "openshift/rbac.authorization.k8s.io_v1_role_gatekeeper-manager-role.yaml"
        );
        assert_eq!(
            AssetId::ManagerRole.template_path(PlatformFlavor::Kubernetes),
            AssetId::ManagerRole.file_name()
        );
        assert_eq!(
            AssetId::AuditDeployment.template_path(PlatformFlavor::OpenShift),
            AssetId::AuditDeployment.file_name()
        );
    }
}
