//! Configuration for world storage and scanning defaults.
//!
//! Load order: `.atlas/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level atlas configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub storage: StorageConfig,
    pub world: WorldConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persistence mode: "store" (durable world file) or "memory".
    /// Memory mode has nothing durable to query, so seeding and scanning
    /// refuse to run under it.
    pub mode: String,
    /// Compress world.json with zstd before writing.
    /// Decompression on load is automatic (detected by magic bytes).
    pub compress: bool,
}

/// World defaults shared by the CLI commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Default blueprint path, relative to the project root.
    pub data: String,
    /// Anchor location ids exempt from orphan reporting (spawn points, hubs).
    pub anchors: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: "store".to_string(),
            compress: false,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            data: "data/locations.json".to_string(),
            anchors: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// True when a durable world file backs the graph.
    pub fn is_store_mode(&self) -> bool {
        self.mode == "store"
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl AtlasConfig {
    /// Load config from `.atlas/config.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".atlas").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment variable overrides
        env_override("ATLAS_STORAGE_MODE", &mut config.storage.mode);
        env_override("ATLAS_STORAGE_COMPRESS", &mut config.storage.compress);

        if config.storage.mode != "store" && config.storage.mode != "memory" {
            anyhow::bail!(
                "storage.mode must be 'store' or 'memory', got '{}'",
                config.storage.mode
            );
        }

        Ok(config)
    }
}
