// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Use cases built on the domain: the override pipeline, the retention merge,
//! a reconciliation pass and the request handler in front of it.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates catalog, store and ownership collaborators

pub mod controller;
pub mod overrides;
pub mod reconciler;
pub mod retention;
