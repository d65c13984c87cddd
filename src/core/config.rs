//! Document engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, COLOR_CURRENT};

/// Tunables for a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Maximum number of undo entries kept. The oldest are evicted beyond it.
    pub undo_depth: usize,
    /// Store checkpoint blobs LZ4-compressed.
    pub compress_checkpoints: bool,
    /// Color code used when a legacy color index has no mapping.
    pub default_part_color: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            undo_depth: 128,
            compress_checkpoints: false,
            default_part_color: COLOR_CURRENT,
        }
    }
}

impl ModelConfig {
    /// Save to a JSON file
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.undo_depth == 0 {
            return Err(Error::Config("undo_depth must be at least 1".to_string()));
        }

        Ok(config)
    }
}
