//! Configuration management for imgcache

pub mod schema;

pub use schema::Config;

use crate::error::{ImgCacheError, ImgCacheResult};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, reads and writes `config.toml`
///
/// Reads never create the file; only `save` (via `config init` or
/// `config set`) does.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use the per-user config location
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Use an explicit file, e.g. from `--config` or `IMGCACHE_CONFIG`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/imgcache/config.toml`, or `./imgcache/config.toml` when
    /// the platform has no config dir
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imgcache")
            .join("config.toml")
    }

    /// Read the config file.
    ///
    /// A missing file means every setting takes its default. Any other read
    /// failure, or a file that does not parse, is an error naming the path.
    pub async fn load(&self) -> ImgCacheResult<Config> {
        let path = &self.config_path;
        match fs::read_to_string(path).await {
            Ok(content) => parse(path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(ImgCacheError::io(
                format!("reading config from {}", path.display()),
                e,
            )),
        }
    }

    /// Write `config`, creating parent directories as needed
    pub async fn save(&self, config: &Config) -> ImgCacheResult<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ImgCacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)
            .await
            .map_err(|e| ImgCacheError::io(format!("writing config to {}", path.display()), e))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(path: &Path, content: &str) -> ImgCacheResult<Config> {
    toml::from_str(content).map_err(|e| ImgCacheError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
