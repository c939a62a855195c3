// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Field-Retention Merge
//!
//! Before an existing object is updated, the fields the cluster owns are copied
//! from the observed object onto the freshly transformed one. Everything else
//! keeps the template-driven value.

use crate::domain::document::{get_nested, set_nested, Document, SchemaError};
use serde_json::{Map, Value};
use tracing::debug;

/// Paths copied from the observed object when present there.
const RETAINED_PATHS: &[&[&str]] = &[
    &["metadata", "resourceVersion"],
    &["metadata", "uid"],
    &["metadata", "creationTimestamp"],
    &["metadata", "generation"],
    &["metadata", "selfLink"],
    &["metadata", "managedFields"],
    &["status"],
    &["spec", "clusterIP"],
    &["spec", "clusterIPs"],
    &["secrets"],
    &["data"],
];

const CA_BUNDLE_PATH: [&str; 2] = ["clientConfig", "caBundle"];

/// Copy cluster-owned fields from `observed` onto `transformed`.
pub fn retain_cluster_fields(transformed: &mut Document, observed: &Document) -> Result<(), SchemaError> {
    for path in RETAINED_PATHS {
        if let Some(value) = observed.get_path(path) {
            transformed.set_path(path, value.clone())?;
        }
    }

    retain_ca_bundles(transformed, observed)
}

fn retain_ca_bundles(transformed: &mut Document, observed: &Document) -> Result<(), SchemaError> {
    // Nothing to carry over unless both sides declare webhooks
    let (Some(observed_webhooks), Some(_)) =
        (observed.get_path(&["webhooks"]), transformed.get_path(&["webhooks"]))
    else {
        return Ok(());
    };
    let observed_webhooks = observed_webhooks
        .as_array()
        .ok_or_else(|| SchemaError::wrong_type(&["webhooks"], "list"))?;

    for (index, webhook) in observed_webhooks.iter().enumerate() {
        let webhook = as_webhook(webhook, index)?;
        let (Some(name), Some(bundle)) = (
            webhook.get("name").and_then(Value::as_str),
            get_nested(webhook, &CA_BUNDLE_PATH),
        ) else {
            continue;
        };

        match transformed.webhook_mut(name) {
            Ok(target) => {
                set_nested(target, &CA_BUNDLE_PATH, bundle.clone())?;
                debug!("Retained caBundle of webhook {}", name);
            }
            // Webhooks dropped from the template stay dropped
            Err(SchemaError::NoSuchEntry { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn as_webhook(value: &Value, index: usize) -> Result<&Map<String, Value>, SchemaError> {
    value.as_object().ok_or_else(|| SchemaError::WrongType {
        path: format!("webhooks[{index}]"),
        expected: "map",
    })
}
