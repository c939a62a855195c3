// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment platform the operand runs on.
///
/// OpenShift manages pod security itself and does not pre-create the operand
/// namespace, which changes a handful of override and selection branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFlavor {
    #[default]
    Kubernetes,
    OpenShift,
}

impl PlatformFlavor {
    pub fn is_openshift(&self) -> bool {
        matches!(self, Self::OpenShift)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::OpenShift => "openshift",
        }
    }
}

impl fmt::Display for PlatformFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            "openshift" => Ok(Self::OpenShift),
            other => Err(format!(
                "Unknown platform '{}'. Supported: kubernetes, openshift",
                other
            )),
        }
    }
}

/// Source of the active platform flavor.
pub trait PlatformDetector: Send + Sync {
    fn current_flavor(&self) -> PlatformFlavor;
}

/// Platform fixed by configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPlatform(pub PlatformFlavor);

impl PlatformDetector for StaticPlatform {
    fn current_flavor(&self) -> PlatformFlavor {
        self.0
    }
}
