// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Override Pipeline
//!
//! Rewrites a freshly loaded catalog template with the values of a
//! [`GatekeeperSpec`]. Rules are chosen by [`AssetKind`]; every rule is a no-op
//! when its spec field is unset and yields the same document when applied
//! twice.
//!
//! | Kind | Rules |
//! |------|-------|
//! | Namespace | name := target namespace, nothing else |
//! | Audit deployment | common pod overrides, audit flags, replicas, resources |
//! | Webhook deployment | common pod overrides, webhook flags, replicas, resources, `--enable-mutation` |
//! | Validating webhook configuration | failure policy, namespace selector |
//! | Cluster role | mutation RBAC rules removed while mutation is disabled |
//!
//! Namespaced assets additionally get their namespace (and the namespace
//! references nested in webhook client configs, binding subjects and the
//! webhook's `--exempt-namespace` flag) rewritten to the target namespace.
//!
//! On OpenShift both deployments lose their pod template annotations: the
//! `spec.template.metadata.annotations` key is removed rather than set to an
//! empty map, so rendered manifests carry no `annotations: {}`.

use crate::domain::asset::{AssetId, AssetKind};
use crate::domain::document::{set_nested, Document, SchemaError};
use crate::domain::gatekeeper::{AuditConfig, GatekeeperSpec, WebhookConfig};
use crate::domain::platform::PlatformFlavor;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const MANAGER_CONTAINER: &str = "manager";
pub const VALIDATION_WEBHOOK_NAME: &str = "validation.gatekeeper.sh";
pub const MUTATIONS_API_GROUP: &str = "mutations.gatekeeper.sh";
pub const ADMISSION_REGISTRATION_API_GROUP: &str = "admissionregistration.k8s.io";
pub const MUTATING_WEBHOOK_CONFIGURATIONS_RESOURCE: &str = "mutatingwebhookconfigurations";

pub const LOG_LEVEL_ARG: &str = "--log-level";
pub const AUDIT_INTERVAL_ARG: &str = "--audit-interval";
pub const CONSTRAINT_VIOLATION_LIMIT_ARG: &str = "--constraint-violations-limit";
pub const AUDIT_FROM_CACHE_ARG: &str = "--audit-from-cache";
pub const AUDIT_CHUNK_SIZE_ARG: &str = "--audit-chunk-size";
pub const EMIT_AUDIT_EVENTS_ARG: &str = "--emit-audit-events";
pub const EMIT_ADMISSION_EVENTS_ARG: &str = "--emit-admission-events";
pub const EXEMPT_NAMESPACE_ARG: &str = "--exempt-namespace";
pub const ENABLE_MUTATION_ARG: &str = "--enable-mutation";

const POD_SPEC: [&str; 3] = ["spec", "template", "spec"];

/// Inputs shared by every rule of one pass.
#[derive(Debug, Clone, Copy)]
pub struct OverrideContext<'a> {
    pub spec: &'a GatekeeperSpec,
    pub namespace: &'a str,
    pub platform: PlatformFlavor,
}

type SpecOverride = fn(&mut Document, &GatekeeperSpec) -> Result<(), SchemaError>;

/// Pod-level overrides shared by the audit and webhook deployments.
const COMMON_OVERRIDES: [SpecOverride; 5] = [
    set_affinity,
    set_node_selector,
    set_pod_annotations,
    set_tolerations,
    set_image,
];

type RuleMatcher = fn(&Map<String, Value>, usize) -> Result<bool, SchemaError>;

const MUTATING_RBAC_RULE_MATCHERS: [RuleMatcher; 2] = [
    matches_mutations_api_group_rule,
    matches_mutating_webhook_configuration_rule,
];

// ============================================================================
// Entry point
// ============================================================================

pub fn apply_overrides(
    asset: AssetId,
    document: &mut Document,
    ctx: &OverrideContext<'_>,
) -> Result<(), SchemaError> {
    let kind = asset.kind();
    debug!("Applying {:?} overrides to {}", kind, asset);

    if kind == AssetKind::Namespace {
        return document.set_name(ctx.namespace);
    }

    set_namespace(kind, document, ctx.namespace)?;

    match kind {
        AssetKind::AuditDeployment => {
            common_overrides(document, ctx.spec)?;
            if let Some(audit) = &ctx.spec.audit {
                audit_overrides(document, audit)?;
            }
            if ctx.platform.is_openshift() {
                document.clear_pod_annotations()?;
            }
        }
        AssetKind::WebhookDeployment => {
            common_overrides(document, ctx.spec)?;
            if let Some(webhook) = &ctx.spec.webhook {
                webhook_overrides(document, webhook)?;
            }
            if ctx.platform.is_openshift() {
                document.clear_pod_annotations()?;
            }
            if ctx.spec.mutating_webhook_enabled() {
                set_manager_arg(document, ENABLE_MUTATION_ARG, "true")?;
            }
        }
        AssetKind::ValidatingWebhookConfiguration => {
            if let Some(webhook) = &ctx.spec.webhook {
                validating_webhook_configuration_overrides(document, webhook)?;
            }
        }
        AssetKind::ClusterRole => {
            if !ctx.spec.mutating_webhook_enabled() {
                remove_mutating_rbac_rules(document)?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn common_overrides(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    for apply in COMMON_OVERRIDES {
        apply(document, spec)?;
    }
    Ok(())
}

fn audit_overrides(document: &mut Document, audit: &AuditConfig) -> Result<(), SchemaError> {
    if let Some(replicas) = audit.replicas {
        document.set_replicas(replicas)?;
    }
    if let Some(level) = audit.log_level {
        set_manager_arg(document, LOG_LEVEL_ARG, level.as_str())?;
    }
    if let Some(interval) = audit.audit_interval {
        set_manager_arg(
            document,
            AUDIT_INTERVAL_ARG,
            &whole_seconds(interval).to_string(),
        )?;
    }
    if let Some(limit) = audit.constraint_violation_limit {
        set_manager_arg(document, CONSTRAINT_VIOLATION_LIMIT_ARG, &limit.to_string())?;
    }
    if let Some(mode) = audit.audit_from_cache {
        set_manager_arg(document, AUDIT_FROM_CACHE_ARG, mode.as_flag())?;
    }
    if let Some(chunk_size) = audit.audit_chunk_size {
        set_manager_arg(document, AUDIT_CHUNK_SIZE_ARG, &chunk_size.to_string())?;
    }
    if let Some(mode) = audit.emit_audit_events {
        set_manager_arg(document, EMIT_AUDIT_EVENTS_ARG, mode.as_flag())?;
    }
    if let Some(resources) = &audit.resources {
        set_manager_resources(document, resources)?;
    }
    Ok(())
}

fn webhook_overrides(document: &mut Document, webhook: &WebhookConfig) -> Result<(), SchemaError> {
    if let Some(replicas) = webhook.replicas {
        document.set_replicas(replicas)?;
    }
    if let Some(level) = webhook.log_level {
        set_manager_arg(document, LOG_LEVEL_ARG, level.as_str())?;
    }
    if let Some(mode) = webhook.emit_admission_events {
        set_manager_arg(document, EMIT_ADMISSION_EVENTS_ARG, mode.as_flag())?;
    }
    if let Some(resources) = &webhook.resources {
        set_manager_resources(document, resources)?;
    }
    Ok(())
}

fn validating_webhook_configuration_overrides(
    document: &mut Document,
    webhook: &WebhookConfig,
) -> Result<(), SchemaError> {
    if let Some(policy) = webhook.failure_policy {
        document.webhook_mut(VALIDATION_WEBHOOK_NAME)?.insert(
            "failurePolicy".to_string(),
            Value::String(policy.as_str().to_string()),
        );
    }
    if let Some(selector) = &webhook.namespace_selector {
        let selector = to_json(selector, "webhooks[].namespaceSelector")?;
        document
            .webhook_mut(VALIDATION_WEBHOOK_NAME)?
            .insert("namespaceSelector".to_string(), selector);
    }
    Ok(())
}

// ============================================================================
// Namespace injection
// ============================================================================

fn set_namespace(kind: AssetKind, document: &mut Document, namespace: &str) -> Result<(), SchemaError> {
    // Cluster-scoped templates carry no namespace and must not gain one
    if document.namespace().is_some() {
        document.set_namespace(namespace)?;
    }

    match kind {
        AssetKind::ValidatingWebhookConfiguration | AssetKind::MutatingWebhookConfiguration => {
            set_client_config_namespace(document, namespace)
        }
        AssetKind::WebhookDeployment => set_manager_arg(document, EXEMPT_NAMESPACE_ARG, namespace),
        AssetKind::ClusterRoleBinding | AssetKind::RoleBinding => {
            set_subject_namespace(document, namespace)
        }
        _ => Ok(()),
    }
}

fn set_client_config_namespace(document: &mut Document, namespace: &str) -> Result<(), SchemaError> {
    for (index, webhook) in document.webhooks_mut()?.iter_mut().enumerate() {
        let webhook = webhook.as_object_mut().ok_or_else(|| SchemaError::WrongType {
            path: format!("webhooks[{index}]"),
            expected: "map",
        })?;
        set_nested(
            webhook,
            &["clientConfig", "service", "namespace"],
            Value::String(namespace.to_string()),
        )?;
    }
    Ok(())
}

fn set_subject_namespace(document: &mut Document, namespace: &str) -> Result<(), SchemaError> {
    for (index, subject) in document.subjects_mut()?.iter_mut().enumerate() {
        let subject = subject.as_object_mut().ok_or_else(|| SchemaError::WrongType {
            path: format!("subjects[{index}]"),
            expected: "map",
        })?;
        subject.insert("namespace".to_string(), Value::String(namespace.to_string()));
    }
    Ok(())
}

// ============================================================================
// Pod template setters
// ============================================================================

fn set_affinity(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    match &spec.affinity {
        Some(affinity) => document.set_path(&pod_spec_path("affinity"), affinity.clone()),
        None => Ok(()),
    }
}

fn set_node_selector(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    match &spec.node_selector {
        Some(selector) => document.set_path(&pod_spec_path("nodeSelector"), string_map(selector)),
        None => Ok(()),
    }
}

fn set_pod_annotations(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    match &spec.pod_annotations {
        Some(annotations) => document.set_pod_annotations(annotations),
        None => Ok(()),
    }
}

fn set_tolerations(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    match &spec.tolerations {
        Some(tolerations) => {
            let value = to_json(tolerations, "spec.template.spec.tolerations")?;
            document.set_path(&pod_spec_path("tolerations"), value)
        }
        None => Ok(()),
    }
}

fn set_image(document: &mut Document, spec: &GatekeeperSpec) -> Result<(), SchemaError> {
    let Some(image) = &spec.image else {
        return Ok(());
    };
    if image.image.is_none() && image.image_pull_policy.is_none() {
        return Ok(());
    }

    let mut manager = document.container_mut(MANAGER_CONTAINER)?;
    if let Some(name) = &image.image {
        manager.set_image(name);
    }
    if let Some(policy) = image.image_pull_policy {
        manager.set_image_pull_policy(policy.as_str());
    }
    Ok(())
}

fn set_manager_arg(document: &mut Document, flag: &str, value: &str) -> Result<(), SchemaError> {
    document.container_mut(MANAGER_CONTAINER)?.set_arg(flag, value)
}

fn set_manager_resources<T: Serialize>(document: &mut Document, resources: &T) -> Result<(), SchemaError> {
    let value = to_json(resources, "resources")?;
    document.container_mut(MANAGER_CONTAINER)?.set_resources(value);
    Ok(())
}

fn pod_spec_path(field: &'static str) -> [&'static str; 4] {
    [POD_SPEC[0], POD_SPEC[1], POD_SPEC[2], field]
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn to_json<T: Serialize>(value: &T, path: &str) -> Result<Value, SchemaError> {
    serde_json::to_value(value).map_err(|e| SchemaError::Encode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Round to whole seconds, halves away from zero, saturating at `u64::MAX`.
fn whole_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    if duration.subsec_nanos() >= 500_000_000 {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}

// ============================================================================
// RBAC
// ============================================================================

fn remove_mutating_rbac_rules(document: &mut Document) -> Result<(), SchemaError> {
    for matcher in MUTATING_RBAC_RULE_MATCHERS {
        remove_rbac_rule(document, matcher)?;
    }
    Ok(())
}

/// Remove the first rule accepted by `matcher`; later matches are kept.
fn remove_rbac_rule(document: &mut Document, matcher: RuleMatcher) -> Result<(), SchemaError> {
    let rules = document.rules_mut()?;

    let mut matched = None;
    for (index, rule) in rules.iter().enumerate() {
        let rule = rule.as_object().ok_or_else(|| SchemaError::WrongType {
            path: format!("rules[{index}]"),
            expected: "map",
        })?;
        if matcher(rule, index)? {
            matched = Some(index);
            break;
        }
    }

    if let Some(index) = matched {
        rules.remove(index);
        debug!("Removed RBAC rule at index {}", index);
    }
    Ok(())
}

fn matches_mutations_api_group_rule(rule: &Map<String, Value>, index: usize) -> Result<bool, SchemaError> {
    Ok(first_entry(rule, "apiGroups", index)? == Some(MUTATIONS_API_GROUP))
}

fn matches_mutating_webhook_configuration_rule(
    rule: &Map<String, Value>,
    index: usize,
) -> Result<bool, SchemaError> {
    if first_entry(rule, "apiGroups", index)? != Some(ADMISSION_REGISTRATION_API_GROUP) {
        return Ok(false);
    }
    Ok(first_entry(rule, "resources", index)? == Some(MUTATING_WEBHOOK_CONFIGURATIONS_RESOURCE))
}

fn first_entry<'r>(
    rule: &'r Map<String, Value>,
    field: &str,
    index: usize,
) -> Result<Option<&'r str>, SchemaError> {
    let path = format!("rules[{index}].{field}");
    let list = rule
        .get(field)
        .ok_or_else(|| SchemaError::Missing { path: path.clone() })?
        .as_array()
        .ok_or_else(|| SchemaError::WrongType {
            path: path.clone(),
            expected: "list",
        })?;

    match list.first() {
        None => Ok(None),
        Some(entry) => entry.as_str().map(Some).ok_or(SchemaError::WrongType {
            path,
            expected: "list of strings",
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gatekeeper::{
        FailurePolicy, Gatekeeper, ImageConfig, ImagePullPolicy, LabelSelector, LogLevel, Mode, Quantity,
        ResourceRequirements, Toleration,
    };
    use serde_json::json;

    fn deployment(name: &str) -> Document {
        Document::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": name, "namespace": "gatekeeper-system" },
            "spec": {
                "replicas": 1,
                "template": {
                    "metadata": {
                        "annotations": { "container.seccomp.security.alpha.kubernetes.io/manager": "runtime/default" }
                    },
                    "spec": {
                        "containers": [{
                            "name": "manager",
                            "image": "openpolicyagent/gatekeeper:v3.3.0",
                            "args": ["--operation=audit", "--log-level=INFO", "--logtostderr"]
                        }]
                    }
                }
            }
        }))
        .unwrap()
    }

    fn cluster_role() -> Document {
        Document::from_value(json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRole",
            "metadata": { "name": "gatekeeper-manager-role" },
            "rules": [
                { "apiGroups": ["*"], "resources": ["*"], "verbs": ["get"] },
                { "apiGroups": ["admissionregistration.k8s.io"], "resources": ["mutatingwebhookconfigurations"], "verbs": ["get"] },
                { "apiGroups": ["mutations.gatekeeper.sh"], "resources": ["*"], "verbs": ["get"] },
                { "apiGroups": ["admissionregistration.k8s.io"], "resources": ["validatingwebhookconfigurations"], "verbs": ["get"] },
                { "apiGroups": ["mutations.gatekeeper.sh"], "resources": ["assign"], "verbs": ["get"] }
            ]
        }))
        .unwrap()
    }

    fn manager_args(document: &mut Document) -> Vec<String> {
        document.container_mut(MANAGER_CONTAINER).unwrap().args().unwrap()
    }

    fn apply(asset: AssetId, document: &mut Document, spec: &GatekeeperSpec, platform: PlatformFlavor) {
        let ctx = OverrideContext {
            spec,
            namespace: "policy-system",
            platform,
        };
        apply_overrides(asset, document, &ctx).unwrap();
    }

    #[test]
    fn test_namespace_asset_only_renamed() {
        let mut doc = Document::from_value(json!({
            "apiVersion": "v1", "kind": "Namespace",
            "metadata": { "name": "gatekeeper-system", "labels": { "admission.gatekeeper.sh/ignore": "no-self-managing" } }
        }))
        .unwrap();
        apply(AssetId::Namespace, &mut doc, &GatekeeperSpec::default(), PlatformFlavor::OpenShift);

        assert_eq!(doc.name(), Some("policy-system"));
        assert_eq!(doc.namespace(), None);
    }

    #[test]
    fn test_audit_scenario_replicas_and_log_level() {
        let spec = GatekeeperSpec {
            audit: Some(AuditConfig {
                replicas: Some(3),
                log_level: Some(LogLevel::Debug),
                ..AuditConfig::default()
            }),
            ..GatekeeperSpec::default()
        };
        let mut doc = deployment("gatekeeper-audit");
        apply(AssetId::AuditDeployment, &mut doc, &spec, PlatformFlavor::Kubernetes);

        assert_eq!(doc.get_path(&["spec", "replicas"]), Some(&json!(3)));
        assert_eq!(doc.namespace(), Some("policy-system"));
        assert_eq!(
            manager_args(&mut doc),
            vec!["--operation=audit", "--log-level=DEBUG", "--logtostderr"]
        );
        // Untouched template defaults
        assert_eq!(
            doc.get_path(&["spec", "template", "spec", "containers"]).unwrap()[0]["image"],
            json!("openpolicyagent/gatekeeper:v3.3.0")
        );
        assert!(doc.get_path(&["spec", "template", "metadata", "annotations"]).is_some());
    }

    #[test]
    fn test_audit_flags() {
        let spec = GatekeeperSpec {
            audit: Some(AuditConfig {
                audit_interval: Some(Duration::from_millis(89_500)),
                constraint_violation_limit: Some(55),
                audit_from_cache: Some(Mode::Enabled),
                audit_chunk_size: Some(500),
                emit_audit_events: Some(Mode::Disabled),
                resources: Some(ResourceRequirements {
                    limits: Some(BTreeMap::from([("cpu".to_string(), Quantity::from("2"))])),
                    requests: None,
                }),
                ..AuditConfig::default()
            }),
            ..GatekeeperSpec::default()
        };
        let mut doc = deployment("gatekeeper-audit");
        apply(AssetId::AuditDeployment, &mut doc, &spec, PlatformFlavor::Kubernetes);

        assert_eq!(
            manager_args(&mut doc),
            vec![
                "--operation=audit",
                "--log-level=INFO",
                "--logtostderr",
                "--audit-interval=90",
                "--constraint-violations-limit=55",
                "--audit-from-cache=true",
                "--audit-chunk-size=500",
                "--emit-audit-events=false",
            ]
        );
        assert_eq!(
            doc.get_path(&["spec", "template", "spec", "containers"]).unwrap()[0]["resources"],
            json!({ "limits": { "cpu": "2" } })
        );
    }

    #[test]
    fn test_overrides_are_idempotent() {
        let spec = GatekeeperSpec {
            audit: Some(AuditConfig {
                replicas: Some(2),
                log_level: Some(LogLevel::Error),
                audit_interval: Some(Duration::from_secs(30)),
                emit_audit_events: Some(Mode::Enabled),
                ..AuditConfig::default()
            }),
            node_selector: Some(BTreeMap::from([("kubernetes.io/os".to_string(), "linux".to_string())])),
            ..GatekeeperSpec::default()
        };

        let mut once = deployment("gatekeeper-audit");
        apply(AssetId::AuditDeployment, &mut once, &spec, PlatformFlavor::OpenShift);
        let mut twice = once.clone();
        apply(AssetId::AuditDeployment, &mut twice, &spec, PlatformFlavor::OpenShift);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_common_pod_overrides() {
        let spec = GatekeeperSpec {
            image: Some(ImageConfig {
                image: Some("registry.local/gatekeeper:v3.3.1".to_string()),
                image_pull_policy: Some(ImagePullPolicy::Always),
            }),
            affinity: Some(json!({ "podAntiAffinity": {} })),
            tolerations: Some(vec![Toleration {
                key: Some("dedicated".to_string()),
                operator: Some("Exists".to_string()),
                ..Toleration::default()
            }]),
            pod_annotations: Some(BTreeMap::from([("a".to_string(), "b".to_string())])),
            ..GatekeeperSpec::default()
        };
        let mut doc = deployment("gatekeeper-controller-manager");
        apply(AssetId::WebhookDeployment, &mut doc, &spec, PlatformFlavor::Kubernetes);

        let pod_spec = doc.get_path(&["spec", "template", "spec"]).unwrap();
        assert_eq!(pod_spec["affinity"], json!({ "podAntiAffinity": {} }));
        assert_eq!(pod_spec["tolerations"], json!([{ "key": "dedicated", "operator": "Exists" }]));
        assert_eq!(pod_spec["containers"][0]["image"], json!("registry.local/gatekeeper:v3.3.1"));
        assert_eq!(pod_spec["containers"][0]["imagePullPolicy"], json!("Always"));
        assert_eq!(
            doc.get_path(&["spec", "template", "metadata", "annotations"]),
            Some(&json!({ "a": "b" }))
        );
    }

    #[test]
    fn test_webhook_deployment_namespace_and_mutation() {
        let spec = GatekeeperSpec {
            mutating_webhook: Some(Mode::Enabled),
            webhook: Some(WebhookConfig {
                emit_admission_events: Some(Mode::Enabled),
                ..WebhookConfig::default()
            }),
            ..GatekeeperSpec::default()
        };
        let mut doc = deployment("gatekeeper-controller-manager");
        apply(AssetId::WebhookDeployment, &mut doc, &spec, PlatformFlavor::Kubernetes);

        let args = manager_args(&mut doc);
        assert!(args.contains(&"--exempt-namespace=policy-system".to_string()));
        assert!(args.contains(&"--emit-admission-events=true".to_string()));
        assert!(args.contains(&"--enable-mutation=true".to_string()));
    }

    #[test]
    fn test_webhook_deployment_without_mutation() {
        let mut doc = deployment("gatekeeper-controller-manager");
        apply(AssetId::WebhookDeployment, &mut doc, &GatekeeperSpec::default(), PlatformFlavor::Kubernetes);

        assert!(!manager_args(&mut doc).iter().any(|a| a.starts_with(ENABLE_MUTATION_ARG)));
    }

    #[test]
    fn test_openshift_strips_pod_annotations() {
        let spec = GatekeeperSpec {
            pod_annotations: Some(BTreeMap::from([("a".to_string(), "b".to_string())])),
            ..GatekeeperSpec::default()
        };
        for asset in [AssetId::AuditDeployment, AssetId::WebhookDeployment] {
            let mut doc = deployment("d");
            apply(asset, &mut doc, &spec, PlatformFlavor::OpenShift);
            assert!(doc.get_path(&["spec", "template", "metadata", "annotations"]).is_none());
        }
    }

    #[test]
    fn test_validating_webhook_configuration() {
        let mut doc = Document::from_value(json!({
            "apiVersion": "admissionregistration.k8s.io/v1beta1",
            "kind": "ValidatingWebhookConfiguration",
            "metadata": { "name": "gatekeeper-validating-webhook-configuration" },
            "webhooks": [
                { "name": "validation.gatekeeper.sh", "failurePolicy": "Ignore",
                  "clientConfig": { "service": { "name": "gatekeeper-webhook-service", "namespace": "gatekeeper-system" } } },
                { "name": "check-ignore-label.gatekeeper.sh", "failurePolicy": "Fail",
                  "clientConfig": { "service": { "name": "gatekeeper-webhook-service", "namespace": "gatekeeper-system" } } }
            ]
        }))
        .unwrap();
        let spec = GatekeeperSpec {
            webhook: Some(WebhookConfig {
                failure_policy: Some(FailurePolicy::Fail),
                namespace_selector: Some(LabelSelector {
                    match_labels: Some(BTreeMap::from([("env".to_string(), "prod".to_string())])),
                    match_expressions: None,
                }),
                ..WebhookConfig::default()
            }),
            ..GatekeeperSpec::default()
        };
        apply(AssetId::ValidatingWebhookConfiguration, &mut doc, &spec, PlatformFlavor::Kubernetes);

        let webhooks = doc.get_path(&["webhooks"]).unwrap();
        assert_eq!(webhooks[0]["failurePolicy"], json!("Fail"));
        assert_eq!(webhooks[0]["namespaceSelector"], json!({ "matchLabels": { "env": "prod" } }));
        assert_eq!(webhooks[1]["failurePolicy"], json!("Fail"));
        assert!(webhooks[1].get("namespaceSelector").is_none());
        for webhook in webhooks.as_array().unwrap() {
            assert_eq!(webhook["clientConfig"]["service"]["namespace"], json!("policy-system"));
        }
    }

    #[test]
    fn test_binding_subjects_get_namespace() {
        let mut doc = Document::from_value(json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRoleBinding",
            "metadata": { "name": "gatekeeper-manager-rolebinding" },
            "subjects": [ { "kind": "ServiceAccount", "name": "gatekeeper-admin", "namespace": "gatekeeper-system" } ]
        }))
        .unwrap();
        apply(AssetId::ManagerClusterRoleBinding, &mut doc, &GatekeeperSpec::default(), PlatformFlavor::Kubernetes);

        assert_eq!(doc.namespace(), None);
        assert_eq!(doc.get_path(&["subjects"]).unwrap()[0]["namespace"], json!("policy-system"));
    }

    #[test]
    fn test_cluster_role_mutation_rules_removed_first_match_only() {
        let mut doc = cluster_role();
        apply(AssetId::ManagerClusterRole, &mut doc, &GatekeeperSpec::default(), PlatformFlavor::Kubernetes);

        let rules = doc.get_path(&["rules"]).unwrap().as_array().unwrap().clone();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0]["apiGroups"], json!(["*"]));
        assert_eq!(rules[1]["resources"], json!(["validatingwebhookconfigurations"]));
        // Second rule for the mutations group survives the first-match removal
        assert_eq!(rules[2]["resources"], json!(["assign"]));
    }

    #[test]
    fn test_cluster_role_untouched_when_mutation_enabled() {
        let spec = GatekeeperSpec {
            mutating_webhook: Some(Mode::Enabled),
            ..GatekeeperSpec::default()
        };
        let mut doc = cluster_role();
        apply(AssetId::ManagerClusterRole, &mut doc, &spec, PlatformFlavor::Kubernetes);
        assert_eq!(doc, cluster_role());
    }

    #[test]
    fn test_cluster_role_without_rules_is_schema_error() {
        let mut doc = Document::from_value(json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRole",
            "metadata": { "name": "gatekeeper-manager-role" }
        }))
        .unwrap();
        let ctx = OverrideContext {
            spec: &GatekeeperSpec::default(),
            namespace: "gatekeeper-system",
            platform: PlatformFlavor::Kubernetes,
        };
        assert_eq!(
            apply_overrides(AssetId::ManagerClusterRole, &mut doc, &ctx),
            Err(SchemaError::Missing { path: "rules".to_string() })
        );
    }

    #[test]
    fn test_missing_args_is_schema_error() {
        let mut doc = Document::from_value(json!({
            "apiVersion": "apps/v1", "kind": "Deployment",
            "metadata": { "name": "gatekeeper-audit", "namespace": "gatekeeper-system" },
            "spec": { "template": { "spec": { "containers": [ { "name": "manager" } ] } } }
        }))
        .unwrap();
        let spec = GatekeeperSpec {
            audit: Some(AuditConfig {
                log_level: Some(LogLevel::Debug),
                ..AuditConfig::default()
            }),
            ..GatekeeperSpec::default()
        };
        let ctx = OverrideContext {
            spec: &spec,
            namespace: "gatekeeper-system",
            platform: PlatformFlavor::Kubernetes,
        };
        assert!(matches!(
            apply_overrides(AssetId::AuditDeployment, &mut doc, &ctx),
            Err(SchemaError::Missing { .. })
        ));
    }

    #[test]
    fn test_whole_seconds_rounding() {
        assert_eq!(whole_seconds(Duration::from_millis(1_499)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1_500)), 2);
        assert_eq!(whole_seconds(Duration::from_secs(60)), 60);
    }

    #[test]
    fn test_whole_seconds_saturates_at_max() {
        assert_eq!(whole_seconds(Duration::new(u64::MAX, 600_000_000)), u64::MAX);
        assert_eq!(whole_seconds(Duration::new(u64::MAX, 400_000_000)), u64::MAX);
    }

    #[test]
    fn test_audit_interval_at_duration_limit() {
        let gatekeeper: Gatekeeper = serde_yaml::from_str(
            r#"
apiVersion: operator.gatekeeper.sh/v1alpha1
kind: Gatekeeper
metadata:
  name: gatekeeper
spec:
  audit:
    auditInterval: 18446744073709551615s 600ms
"#,
        )
        .unwrap();

        let mut doc = deployment("gatekeeper-audit");
        apply(AssetId::AuditDeployment, &mut doc, &gatekeeper.spec, PlatformFlavor::Kubernetes);

        let expected = format!("{AUDIT_INTERVAL_ARG}={}", u64::MAX);
        assert!(manager_args(&mut doc).contains(&expected));
    }
}
