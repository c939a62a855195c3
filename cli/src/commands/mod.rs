// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Gatekeeper operator CLI

pub mod assets;
pub mod config;
pub mod reconcile;
pub mod render;

pub use self::assets::AssetsCommand;
pub use self::config::ConfigCommand;
pub use self::reconcile::ReconcileCommand;
pub use self::render::RenderCommand;
