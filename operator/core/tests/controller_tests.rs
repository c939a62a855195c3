// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use gatekeeper_operator_core::application::controller::{
    ControllerError, GatekeeperController, RequestOutcome,
};
use gatekeeper_operator_core::application::reconciler::GatekeeperReconciler;
use gatekeeper_operator_core::domain::document::Document;
use gatekeeper_operator_core::domain::gatekeeper::{AuditConfig, Gatekeeper, GatekeeperSpec};
use gatekeeper_operator_core::domain::platform::{PlatformFlavor, StaticPlatform};
use gatekeeper_operator_core::infrastructure::catalog::EmbeddedCatalog;
use gatekeeper_operator_core::infrastructure::memory_store::{InMemoryObjectStore, StoreCall};
use gatekeeper_operator_core::infrastructure::owner::ControllerReferenceLinker;
use serde_json::json;
use std::sync::Arc;

fn controller(store: Arc<InMemoryObjectStore>) -> GatekeeperController {
    let reconciler = GatekeeperReconciler::new(
        Arc::new(EmbeddedCatalog::new()),
        store.clone(),
        Arc::new(ControllerReferenceLinker::new()),
        Arc::new(StaticPlatform(PlatformFlavor::Kubernetes)),
        "gatekeeper-system",
    );
    GatekeeperController::new(store, reconciler)
}

fn store_gatekeeper(store: &InMemoryObjectStore, gatekeeper: &Gatekeeper) {
    let document = Document::from_value(serde_json::to_value(gatekeeper).unwrap()).unwrap();
    store.insert(document).unwrap();
}

#[tokio::test]
async fn test_other_names_are_ignored() {
    let store = Arc::new(InMemoryObjectStore::new());
    let outcome = controller(store.clone()).handle("gatekeeper-2").await.unwrap();

    assert_eq!(outcome, RequestOutcome::Ignored);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_missing_resource_ends_quietly() {
    let store = Arc::new(InMemoryObjectStore::new());
    let outcome = controller(store.clone()).handle("gatekeeper").await.unwrap();

    assert_eq!(outcome, RequestOutcome::NotFound);
    assert_eq!(
        store.calls(),
        vec![StoreCall::Get(GatekeeperController::gatekeeper_key("gatekeeper"))]
    );
}

#[tokio::test]
async fn test_stored_resource_is_reconciled() {
    let store = Arc::new(InMemoryObjectStore::new());
    let gatekeeper = Gatekeeper::new(
        "gatekeeper",
        GatekeeperSpec {
            audit: Some(AuditConfig {
                replicas: Some(5),
                ..AuditConfig::default()
            }),
            ..GatekeeperSpec::default()
        },
    )
    .with_uid("0b8f6c1a-1111-4c3b-8e2f-5d9a7c0e4b21");
    store_gatekeeper(&store, &gatekeeper);

    let controller = controller(store.clone());
    let RequestOutcome::Reconciled(summary) = controller.handle("gatekeeper").await.unwrap() else {
        panic!("expected a reconciliation");
    };
    assert_eq!(summary.created.len(), 15);

    let audit = summary
        .created
        .iter()
        .find(|k| k.name == "gatekeeper-audit")
        .cloned()
        .unwrap();
    let stored = store.get_document(&audit).unwrap();
    assert_eq!(stored.get_path(&["spec", "replicas"]), Some(&json!(5)));
    assert_eq!(
        stored.get_path(&["metadata", "ownerReferences"]).unwrap()[0]["uid"],
        json!("0b8f6c1a-1111-4c3b-8e2f-5d9a7c0e4b21")
    );

    // A repeated request converges on updates only
    let RequestOutcome::Reconciled(again) = controller.handle("gatekeeper").await.unwrap() else {
        panic!("expected a reconciliation");
    };
    assert!(again.created.is_empty());
    assert_eq!(again.updated.len(), 15);
}

#[tokio::test]
async fn test_undecodable_resource() {
    let store = Arc::new(InMemoryObjectStore::new());
    let document = Document::from_value(json!({
        "apiVersion": "operator.gatekeeper.sh/v1alpha1",
        "kind": "Gatekeeper",
        "metadata": { "name": "gatekeeper", "uid": "u" },
        "spec": { "audit": { "replicas": "three" } }
    }))
    .unwrap();
    store.insert(document).unwrap();

    let err = controller(store).handle("gatekeeper").await.unwrap_err();
    assert!(matches!(err, ControllerError::Decode { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_reconcile_failure_surfaces_through_controller() {
    let store = Arc::new(InMemoryObjectStore::new());
    // No uid, so ownership linking fails
    store_gatekeeper(&store, &Gatekeeper::new("gatekeeper", GatekeeperSpec::default()));

    let err = controller(store).handle("gatekeeper").await.unwrap_err();
    assert!(matches!(err, ControllerError::Reconcile(_)));
    assert!(!err.is_retryable());
}
