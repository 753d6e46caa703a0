//! Configuration schema for imgcache
//!
//! Configuration is stored at `~/.config/imgcache/config.toml`

use crate::cache::{gb_to_bytes, EvictionOrder};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Image cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total image size in GB above which the cache reports itself over-filled
    pub max_size_gb: u32,

    /// Ranking direction for evictable images
    pub order: EvictionOrder,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_gb: 20,
            order: EvictionOrder::LowestFirst,
        }
    }
}

impl CacheConfig {
    pub fn max_size_bytes(&self) -> u64 {
        gb_to_bytes(self.max_size_gb)
    }
}
