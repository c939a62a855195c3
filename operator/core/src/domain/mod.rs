// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value types, collaborator interfaces and errors shared by the overlay
//! pipeline and the reconciler.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Gatekeeper resource model, asset catalog, structured documents

pub mod asset;
pub mod document;
pub mod gatekeeper;
pub mod operator_config;
pub mod platform;
pub mod store;
