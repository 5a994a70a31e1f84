use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-level configuration, loaded from `tempo.toml`.
///
/// Every field has a default so a missing file or an empty table yields a
/// working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Budget for the document-store collaborator, the engine's only
/// suspension point. Store implementations are expected to bound each
/// call by `timeout_ms` and surface expiry as a timeout error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

/// Outbound change-feed sizing. When the buffer fills, events are dropped
/// (and logged), never blocking a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_buffer")]
    pub buffer: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            buffer: default_notify_buffer(),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_notify_buffer() -> usize {
    256
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config at {}", path.display()))
    }
}
