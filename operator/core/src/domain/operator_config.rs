// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Operator Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing where
// the operator deploys Gatekeeper and how it runs:
// - Target namespace (normally the operator's own namespace)
// - Platform flavor
// - Template catalog source
// - Logging

use crate::domain::platform::PlatformFlavor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_API_VERSION: &str = "operator.gatekeeper.sh/v1alpha1";
pub const CONFIG_KIND: &str = "OperatorConfig";

pub const ENV_CONFIG_PATH: &str = "GATEKEEPER_OPERATOR_CONFIG";
pub const ENV_NAMESPACE: &str = "GATEKEEPER_OPERATOR_NAMESPACE";
pub const ENV_PLATFORM: &str = "GATEKEEPER_OPERATOR_PLATFORM";

/// Top-level operator configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// API version (must be "operator.gatekeeper.sh/v1alpha1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "OperatorConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: OperatorConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfigSpec {
    /// Namespace Gatekeeper is deployed into
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub platform: PlatformFlavor,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for OperatorConfigSpec {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            platform: PlatformFlavor::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub source: CatalogSource,

    /// Root directory for `source: directory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Templates compiled into the binary
    #[default]
    Embedded,
    /// Templates read from `catalog.path`
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_namespace() -> String {
    "gatekeeper-system".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            api_version: CONFIG_API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            metadata: ConfigMetadata {
                name: "gatekeeper-operator".to_string(),
            },
            spec: OperatorConfigSpec::default(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Discover configuration file using precedence order
    /// 1. GATEKEEPER_OPERATOR_CONFIG environment variable
    /// 2. ./gatekeeper-operator.yaml (working directory)
    /// 3. ~/.gatekeeper-operator/config.yaml (user home)
    /// 4. /etc/gatekeeper-operator/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./gatekeeper-operator.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gatekeeper-operator").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/gatekeeper-operator/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            if is_dns1123_label(&namespace) {
                tracing::info!("Environment override: {}={}", ENV_NAMESPACE, namespace);
                self.spec.namespace = namespace;
            } else {
                tracing::warn!(
                    "Invalid value for {}: '{}'. Expected a DNS-1123 label. Ignoring.",
                    ENV_NAMESPACE,
                    namespace
                );
            }
        }

        if let Some(platform) = lookup(ENV_PLATFORM) {
            match platform.parse::<PlatformFlavor>() {
                Ok(flavor) => {
                    tracing::info!("Environment override: {}={}", ENV_PLATFORM, flavor);
                    self.spec.platform = flavor;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for {}: {}. Ignoring.", ENV_PLATFORM, e);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                CONFIG_API_VERSION
            );
        }

        if self.kind != CONFIG_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if !is_dns1123_label(&self.spec.namespace) {
            anyhow::bail!(
                "spec.namespace '{}' is not a valid DNS-1123 label",
                self.spec.namespace
            );
        }

        if self.spec.catalog.source == CatalogSource::Directory && self.spec.catalog.path.is_none() {
            anyhow::bail!("spec.catalog.path is required when spec.catalog.source is 'directory'");
        }

        Ok(())
    }
}

/// Lowercase alphanumerics and '-', alphanumeric at both ends, at most 63 chars.
fn is_dns1123_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    let edge_ok = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    !bytes.is_empty()
        && bytes.len() <= 63
        && bytes.first().is_some_and(edge_ok)
        && bytes.last().is_some_and(edge_ok)
        && bytes.iter().all(|b| edge_ok(b) || *b == b'-')
}
