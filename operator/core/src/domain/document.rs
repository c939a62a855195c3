// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Structured Document
//!
//! In-memory ownership tree for a single asset instance. Templates are parsed
//! from YAML straight into a `serde_json` map; every transformation in the
//! override pipeline and the retention merge goes through the checked
//! accessors defined here.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed access to the field paths the operator rewrites
//!
//! Accessors never panic and never silently skip: a path whose shape does not
//! match what the catalog promises yields a [`SchemaError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const CONTAINERS_PATH: [&str; 4] = ["spec", "template", "spec", "containers"];
const POD_ANNOTATIONS_PATH: [&str; 4] = ["spec", "template", "metadata", "annotations"];

// ============================================================================
// Errors
// ============================================================================

/// A field path expected by the operator is absent or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("required field '{path}' is missing")]
    Missing { path: String },

    #[error("field '{path}' is not a {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("no entry named '{name}' in '{path}'")]
    NoSuchEntry { path: String, name: String },

    #[error("failed to encode value for '{path}': {reason}")]
    Encode { path: String, reason: String },
}

impl SchemaError {
    pub(crate) fn missing(path: &[&str]) -> Self {
        Self::Missing { path: path.join(".") }
    }

    pub(crate) fn wrong_type(path: &[&str], expected: &'static str) -> Self {
        Self::WrongType {
            path: path.join("."),
            expected,
        }
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Identity of a remote object: (apiVersion, kind, namespace, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace,
            name: name.into(),
        }
    }

    pub fn cluster_scoped(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(api_version, kind, None, name)
    }

    pub fn namespaced(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(api_version, kind, Some(namespace.into()), name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(
                f,
                "{}.{} {}/{}",
                self.kind, self.api_version, namespace, self.name
            ),
            None => write!(f, "{}.{} {}", self.kind, self.api_version, self.name),
        }
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a parsed value; the root of a document must be a map.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(SchemaError::WrongType {
                path: "<root>".to_string(),
                expected: "map",
            }),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_path(&["metadata", "name"]).and_then(Value::as_str)
    }

    /// Namespace from metadata; an empty string counts as cluster scoped.
    pub fn namespace(&self) -> Option<&str> {
        self.get_path(&["metadata", "namespace"])
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), SchemaError> {
        self.set_path(&["metadata", "name"], Value::String(name.to_string()))
    }

    pub fn set_namespace(&mut self, namespace: &str) -> Result<(), SchemaError> {
        self.set_path(
            &["metadata", "namespace"],
            Value::String(namespace.to_string()),
        )
    }

    pub fn key(&self) -> Result<ObjectKey, SchemaError> {
        let api_version = self
            .api_version()
            .ok_or_else(|| SchemaError::missing(&["apiVersion"]))?;
        let kind = self.kind().ok_or_else(|| SchemaError::missing(&["kind"]))?;
        let name = self
            .name()
            .ok_or_else(|| SchemaError::missing(&["metadata", "name"]))?;

        Ok(ObjectKey::new(
            api_version,
            kind,
            self.namespace().map(str::to_string),
            name,
        ))
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        get_nested(&self.0, path)
    }

    /// Set a value, creating intermediate maps as needed.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> Result<(), SchemaError> {
        set_nested(&mut self.0, path, value)
    }

    /// Remove a value. Absent parents are not an error.
    pub fn remove_path(&mut self, path: &[&str]) -> Result<Option<Value>, SchemaError> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(None);
        };

        let mut current = &mut self.0;
        for (depth, segment) in parents.iter().enumerate() {
            match current.get_mut(*segment) {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::Object(map)) => current = map,
                Some(_) => return Err(SchemaError::wrong_type(&path[..=depth], "map")),
            }
        }

        Ok(current.remove(*last))
    }

    fn node_mut(&mut self, path: &[&str]) -> Result<&mut Value, SchemaError> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| SchemaError::missing(path))?;

        let mut current = self
            .0
            .get_mut(*first)
            .ok_or_else(|| SchemaError::missing(&path[..1]))?;

        for (depth, segment) in rest.iter().enumerate() {
            current = current
                .as_object_mut()
                .ok_or_else(|| SchemaError::wrong_type(&path[..=depth], "map"))?
                .get_mut(*segment)
                .ok_or_else(|| SchemaError::missing(&path[..depth + 2]))?;
        }

        Ok(current)
    }

    fn list_mut(&mut self, path: &[&str]) -> Result<&mut Vec<Value>, SchemaError> {
        self.node_mut(path)?
            .as_array_mut()
            .ok_or_else(|| SchemaError::wrong_type(path, "list"))
    }

    // ------------------------------------------------------------------------
    // Named path groups
    // ------------------------------------------------------------------------

    pub fn containers_mut(&mut self) -> Result<&mut Vec<Value>, SchemaError> {
        self.list_mut(&CONTAINERS_PATH)
    }

    pub fn container_mut(&mut self, name: &str) -> Result<Container<'_>, SchemaError> {
        let base = CONTAINERS_PATH.join(".");
        let containers = self.containers_mut()?;

        for (index, entry) in containers.iter_mut().enumerate() {
            let fields = entry.as_object_mut().ok_or_else(|| SchemaError::WrongType {
                path: format!("{base}[{index}]"),
                expected: "map",
            })?;
            let matches = entry_name(fields, &base, index)? == name;
            if matches {
                return Ok(Container {
                    name: name.to_string(),
                    fields,
                });
            }
        }

        Err(SchemaError::NoSuchEntry {
            path: base,
            name: name.to_string(),
        })
    }

    pub fn webhooks_mut(&mut self) -> Result<&mut Vec<Value>, SchemaError> {
        self.list_mut(&["webhooks"])
    }

    pub fn webhook_mut(&mut self, name: &str) -> Result<&mut Map<String, Value>, SchemaError> {
        let webhooks = self.webhooks_mut()?;

        for (index, entry) in webhooks.iter_mut().enumerate() {
            let fields = entry.as_object_mut().ok_or_else(|| SchemaError::WrongType {
                path: format!("webhooks[{index}]"),
                expected: "map",
            })?;
            let matches = entry_name(fields, "webhooks", index)? == name;
            if matches {
                return Ok(fields);
            }
        }

        Err(SchemaError::NoSuchEntry {
            path: "webhooks".to_string(),
            name: name.to_string(),
        })
    }

    pub fn rules_mut(&mut self) -> Result<&mut Vec<Value>, SchemaError> {
        self.list_mut(&["rules"])
    }

    pub fn subjects_mut(&mut self) -> Result<&mut Vec<Value>, SchemaError> {
        self.list_mut(&["subjects"])
    }

    pub fn set_replicas(&mut self, replicas: i32) -> Result<(), SchemaError> {
        self.set_path(&["spec", "replicas"], Value::from(replicas))
    }

    pub fn set_pod_annotations(
        &mut self,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), SchemaError> {
        let map = annotations
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.set_path(&POD_ANNOTATIONS_PATH, Value::Object(map))
    }

    pub fn clear_pod_annotations(&mut self) -> Result<(), SchemaError> {
        self.remove_path(&POD_ANNOTATIONS_PATH).map(|_| ())
    }
}

fn entry_name<'m>(
    fields: &'m Map<String, Value>,
    base: &str,
    index: usize,
) -> Result<&'m str, SchemaError> {
    fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::Missing {
            path: format!("{base}[{index}].name"),
        })
}

pub(crate) fn get_nested<'m>(map: &'m Map<String, Value>, path: &[&str]) -> Option<&'m Value> {
    let (first, rest) = path.split_first()?;
    let mut current = map.get(*first)?;
    for segment in rest {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

/// Set `value` at `path` inside `map`. A `null` intermediate is replaced by a
/// fresh map, any other non-map intermediate is a schema error.
pub(crate) fn set_nested(
    map: &mut Map<String, Value>,
    path: &[&str],
    value: Value,
) -> Result<(), SchemaError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(SchemaError::missing(path));
    };

    let mut current = map;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = entry
            .as_object_mut()
            .ok_or_else(|| SchemaError::wrong_type(&path[..=depth], "map"))?;
    }

    current.insert(last.to_string(), value);
    Ok(())
}

// ============================================================================
// Containers
// ============================================================================

/// Mutable view of one container inside a pod template.
pub struct Container<'a> {
    name: String,
    fields: &'a mut Map<String, Value>,
}

impl Container<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self, field: &str) -> String {
        format!("{}[{}].{}", CONTAINERS_PATH.join("."), self.name, field)
    }

    pub fn args(&self) -> Result<Vec<String>, SchemaError> {
        let path = self.path("args");
        let args = self
            .fields
            .get("args")
            .ok_or_else(|| SchemaError::Missing { path: path.clone() })?
            .as_array()
            .ok_or_else(|| SchemaError::WrongType {
                path: path.clone(),
                expected: "list",
            })?;

        args.iter()
            .enumerate()
            .map(|(index, arg)| {
                arg.as_str().map(str::to_string).ok_or_else(|| SchemaError::WrongType {
                    path: format!("{path}[{index}]"),
                    expected: "string",
                })
            })
            .collect()
    }

    /// Merge a `--flag=value` argument by flag name.
    ///
    /// Entries with the same flag keep their position and get the new value;
    /// when none exists the argument is appended. Re-applying the same
    /// argument leaves the list unchanged.
    pub fn set_arg(&mut self, flag: &str, value: &str) -> Result<(), SchemaError> {
        let path = self.path("args");
        let arg = to_arg(flag, value);
        let args = self
            .fields
            .get_mut("args")
            .ok_or_else(|| SchemaError::Missing { path: path.clone() })?
            .as_array_mut()
            .ok_or_else(|| SchemaError::WrongType {
                path: path.clone(),
                expected: "list",
            })?;

        let mut exists = false;
        for (index, entry) in args.iter_mut().enumerate() {
            let existing = entry.as_str().ok_or_else(|| SchemaError::WrongType {
                path: format!("{path}[{index}]"),
                expected: "string",
            })?;
            let matches = from_arg(existing).0 == flag;
            if matches {
                *entry = Value::String(arg.clone());
                exists = true;
            }
        }

        if !exists {
            args.push(Value::String(arg));
        }
        Ok(())
    }

    pub fn set_image(&mut self, image: &str) {
        self.fields
            .insert("image".to_string(), Value::String(image.to_string()));
    }

    pub fn set_image_pull_policy(&mut self, policy: &str) {
        self.fields.insert(
            "imagePullPolicy".to_string(),
            Value::String(policy.to_string()),
        );
    }

    pub fn set_resources(&mut self, resources: Value) {
        self.fields.insert("resources".to_string(), resources);
    }
}

// ============================================================================
// Command-line arguments
// ============================================================================

pub fn to_arg(name: &str, value: &str) -> String {
    format!("{name}={value}")
}

/// Split `--flag=value` at the first `=`.
pub fn from_arg(arg: &str) -> (&str, Option<&str>) {
    match arg.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (arg, None),
    }
}

// ============================================================================
// Tests
// ============================================================================
