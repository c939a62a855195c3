// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Gatekeeper operator core
//!
//! Declarative manifest overlay and reconciliation engine: selects the
//! Gatekeeper assets that apply to a `Gatekeeper` resource, rewrites each
//! template with the resource's settings and converges the object store to the
//! result while keeping server-owned fields.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Asset selection, override pipeline, retention merge, reconciliation

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
