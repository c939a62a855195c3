// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory object store
//!
//! Behaves like an API server for the fields the operator depends on:
//! server-assigned `uid`, `creationTimestamp` and `resourceVersion`, optimistic
//! concurrency on update. Used by the CLI dry runs and by tests.

use crate::domain::document::{Document, ObjectKey};
use crate::domain::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// One call made against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(ObjectKey),
    Create(ObjectKey),
    Update(ObjectKey),
}

#[derive(Default)]
struct State {
    objects: HashMap<ObjectKey, Document>,
    calls: Vec<StoreCall>,
    revision: u64,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }
}

#[derive(Default)]
pub struct InMemoryObjectStore {
    state: RwLock<State>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` as-is, bypassing server-side defaulting.
    pub fn insert(&self, document: Document) -> Result<ObjectKey, StoreError> {
        let key = document
            .key()
            .map_err(|e| StoreError::Transient(format!("invalid object: {e}")))?;
        self.state.write().objects.insert(key.clone(), document);
        Ok(key)
    }

    pub fn get_document(&self, key: &ObjectKey) -> Option<Document> {
        self.state.read().objects.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<ObjectKey> = self.state.read().objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Calls recorded since creation or the last [`clear_calls`](Self::clear_calls).
    /// The log is unbounded; long-running callers clear it between requests.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.read().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.write().calls.clear();
    }
}

fn document_key(document: &Document) -> Result<ObjectKey, StoreError> {
    document
        .key()
        .map_err(|e| StoreError::Transient(format!("invalid object: {e}")))
}

fn set_metadata(document: &mut Document, field: &str, value: Value) -> Result<(), StoreError> {
    document
        .set_path(&["metadata", field], value)
        .map_err(|e| StoreError::Transient(format!("invalid object metadata: {e}")))
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &ObjectKey) -> Result<Document, StoreError> {
        let mut state = self.state.write();
        state.calls.push(StoreCall::Get(key.clone()));
        state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn create(&self, document: &Document) -> Result<(), StoreError> {
        let key = document_key(document)?;
        let mut state = self.state.write();
        state.calls.push(StoreCall::Create(key.clone()));

        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let mut stored = document.clone();
        let revision = state.next_revision();
        set_metadata(&mut stored, "uid", Value::String(Uuid::new_v4().to_string()))?;
        set_metadata(
            &mut stored,
            "creationTimestamp",
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        )?;
        set_metadata(&mut stored, "resourceVersion", Value::String(revision))?;

        state.objects.insert(key, stored);
        Ok(())
    }

    async fn update(&self, document: &Document) -> Result<(), StoreError> {
        let key = document_key(document)?;
        let mut state = self.state.write();
        state.calls.push(StoreCall::Update(key.clone()));

        let Some(current) = state.objects.get(&key) else {
            return Err(StoreError::NotFound(key));
        };

        let current_version = current.get_path(&["metadata", "resourceVersion"]).cloned();
        let offered_version = document.get_path(&["metadata", "resourceVersion"]).cloned();
        if offered_version.is_some() && offered_version != current_version {
            return Err(StoreError::Conflict(key));
        }

        let uid = current.get_path(&["metadata", "uid"]).cloned();
        let created = current.get_path(&["metadata", "creationTimestamp"]).cloned();

        let mut stored = document.clone();
        if let Some(uid) = uid {
            set_metadata(&mut stored, "uid", uid)?;
        }
        if let Some(created) = created {
            set_metadata(&mut stored, "creationTimestamp", created)?;
        }
        let revision = state.next_revision();
        set_metadata(&mut stored, "resourceVersion", Value::String(revision))?;

        state.objects.insert(key, stored);
        Ok(())
    }
}
