// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Concrete collaborators behind the domain traits.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Template catalogs, in-memory object store, ownership linking

pub mod catalog;
pub mod memory_store;
pub mod owner;
