//! GovGate configuration file handling.
//!
//! Configuration is TOML, stored under the user config directory by
//! default. It carries deployment settings only: the gateway URL, the
//! governance-registry address scope, the credentials file location,
//! webhook targets, and polling behavior. Quorum rules live on the
//! ledger and are fixed at registry bootstrap, not here.
//!
//! The registry address recorded by `deploy-registry` is saved back into
//! this file, so later runs in the same configuration scope can reuse it
//! without passing `--registry`.

use govgate::workflow::orchestrator::PollSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default wait between decision polls.
const DEFAULT_POLL_INTERVAL: &str = "60s";

/// GovGate engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovGateConfig {
    /// Governance gateway settings.
    pub node: NodeConfig,

    /// Registry address scope.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Credential store settings.
    pub credentials: CredentialsConfig,

    /// Webhook notification settings.
    #[serde(default)]
    pub webhooks: WebhookConfig,

    /// Polling settings for the version-proposal flow.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Governance gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC gateway URL. Must be a trusted (loopback or private)
    /// endpoint: it receives the signing key.
    pub gateway_url: String,
}

/// Governance-registry address scope.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryConfig {
    /// Registry address used by propose/vote runs. Written by
    /// `deploy-registry`, or set manually to use an existing registry.
    pub address: Option<String>,
}

/// Credential store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Path to the TOML credentials file.
    pub file: PathBuf,
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookConfig {
    /// Comma-separated list of target base URLs, delivered in order.
    #[serde(default)]
    pub targets: String,

    /// Abort the step on the first failed delivery instead of
    /// best-effort continuation.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Polling settings (humantime duration strings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Wait between decision queries, e.g. "60s", "2m".
    #[serde(default = "default_poll_interval")]
    pub interval: String,

    /// Optional bound on total polling time, e.g. "24h". Unset polls
    /// until the ledger decides or the step is cancelled.
    pub deadline: Option<String>,
}

fn default_poll_interval() -> String {
    DEFAULT_POLL_INTERVAL.to_string()
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            deadline: None,
        }
    }
}

impl PollingConfig {
    /// Parse the duration strings into engine settings.
    pub fn settings(&self) -> Result<PollSettings, Box<dyn std::error::Error>> {
        let interval = humantime::parse_duration(&self.interval)
            .map_err(|e| format!("invalid polling interval '{}': {}", self.interval, e))?;
        let deadline = self
            .deadline
            .as_deref()
            .map(humantime::parse_duration)
            .transpose()
            .map_err(|e| format!("invalid polling deadline: {}", e))?;

        Ok(PollSettings { interval, deadline })
    }
}

impl GovGateConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: GovGateConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Record the bootstrapped registry address and persist it, so
    /// subsequent runs in this configuration scope reuse it.
    pub fn set_registry_address(
        &mut self,
        path: &Path,
        address: String,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.registry.address = Some(address);
        self.save(path)
    }

    /// Generate default configuration content with comments.
    pub fn generate_default_toml(credentials_path: &Path) -> String {
        format!(
            r#"# GovGate Configuration
#
# Quorum percentages and the voter set are fixed at registry bootstrap
# and enforced by the ledger; they are not configurable here.

[node]
# Governance gateway JSON-RPC URL. Must be a TRUSTED endpoint (loopback
# or private network): it receives the signing key for each transaction.
gateway_url = "http://127.0.0.1:8545"

[registry]
# Governance-registry address used by propose/vote runs.
# Written automatically by `govgate deploy-registry`, or set it manually
# to use an existing registry.
# address = "0x..."

[credentials]
# TOML credentials file: one [credentials] table mapping id to a
# 64-hex-character private key.
file = "{credentials_path}"

[webhooks]
# Comma-separated target base URLs, notified in order when a proposal
# opens.
targets = ""

# Abort the step on the first failed delivery instead of continuing
# best-effort.
fail_fast = false

[polling]
# Wait between decision queries.
interval = "60s"

# Optional bound on total polling time, e.g. "24h".
# Unset: poll until the ledger decides or the step is cancelled.
# deadline = "24h"
"#,
            credentials_path = credentials_path.display()
        )
    }

    /// Create and save a default configuration file.
    pub fn create_default(
        config_path: &Path,
        credentials_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(credentials_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("govgate")
        .join("config.toml")
}

/// Default credentials file path, adjacent to the config file.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("govgate")
        .join("credentials.toml")
}
