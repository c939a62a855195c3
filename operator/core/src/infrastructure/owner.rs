// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::document::Document;
use crate::domain::gatekeeper::Gatekeeper;
use crate::domain::store::{OwnerLinker, OwnershipError};
use serde_json::{json, Value};

/// Writes a controller owner reference so deleting the Gatekeeper resource
/// garbage-collects everything the operator created for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerReferenceLinker;

impl ControllerReferenceLinker {
    pub fn new() -> Self {
        Self
    }
}

impl OwnerLinker for ControllerReferenceLinker {
    fn set_owner(&self, child: &mut Document, owner: &Gatekeeper) -> Result<(), OwnershipError> {
        let uid = owner
            .metadata
            .uid
            .as_deref()
            .ok_or_else(|| OwnershipError::MissingUid(owner.metadata.name.clone()))?;

        let mut references: Vec<Value> = match child.get_path(&["metadata", "ownerReferences"]) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(existing)) => existing.clone(),
            Some(_) => {
                return Err(OwnershipError::Invalid(
                    "metadata.ownerReferences is not a list".to_string(),
                ))
            }
        };

        for reference in &references {
            let is_controller = reference.get("controller").and_then(Value::as_bool) == Some(true);
            let same_owner = reference.get("uid").and_then(Value::as_str) == Some(uid);
            if is_controller && !same_owner {
                return Err(OwnershipError::AlreadyOwned {
                    kind: str_field(reference, "kind"),
                    name: str_field(reference, "name"),
                });
            }
        }

        let controller_ref = json!({
            "apiVersion": owner.api_version,
            "kind": owner.kind,
            "name": owner.metadata.name,
            "uid": uid,
            "controller": true,
            "blockOwnerDeletion": true,
        });

        references.retain(|r| r.get("uid").and_then(Value::as_str) != Some(uid));
        references.push(controller_ref);

        child
            .set_path(&["metadata", "ownerReferences"], Value::Array(references))
            .map_err(|e| OwnershipError::Invalid(e.to_string()))
    }
}

fn str_field(reference: &Value, field: &str) -> String {
    reference
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
