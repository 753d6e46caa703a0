//! Error types for imgcache
//!
//! All modules use `ImgCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for imgcache operations
pub type ImgCacheResult<T> = Result<T, ImgCacheError>;

/// All errors that can occur in imgcache
#[derive(Error, Debug)]
pub enum ImgCacheError {
    // Cache errors
    #[error("Image not found in cache: {0}")]
    NotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Replay errors
    #[error("Invalid replay event on line {line}: {reason}")]
    ReplayParse { line: usize, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl ImgCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a not-found error for an image identity
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Whether the referenced image had no matching cache entry
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: imgcache config init --force"),
            Self::ReplayParse { .. } => {
                Some("Each line must be a JSON object with an \"op\" field")
            }
            Self::NotFound(_) => Some("Drop --strict to skip events for unknown images"),
            _ => None,
        }
    }
}
