//! Artifact descriptors and pin tokens
//!
//! The cache only ever looks at an artifact's identity and reported size.
//! Everything else a runtime attaches travels along untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A resident artifact the cache can track
pub trait Artifact {
    /// Unique identity, stable for the artifact's lifetime
    fn id(&self) -> &str;

    /// Size in bytes as reported by the runtime
    fn size_bytes(&self) -> u64;
}

/// Container image as described by the runtime's image listing
///
/// Field aliases accept the capitalized keys emitted by
/// `podman images --format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image ID (e.g. "sha256:...")
    #[serde(alias = "Id")]
    pub id: String,

    /// Repository tags pointing at this image
    #[serde(default, alias = "RepoTags", alias = "Names")]
    pub repo_tags: Vec<String>,

    /// Size in bytes
    #[serde(default, alias = "Size")]
    pub size: u64,

    /// When the image was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Image labels
    #[serde(default, alias = "Labels", skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

impl ImageInfo {
    /// Create an image descriptor with just an identity and size
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            repo_tags: vec![],
            size,
            created: None,
            labels: HashMap::new(),
        }
    }

    /// Attach a repository tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.repo_tags.push(tag.into());
        self
    }

    /// First repository tag, or the short ID when untagged
    pub fn display_name(&self) -> &str {
        match self.repo_tags.first() {
            Some(tag) => tag,
            None => short_id(&self.id),
        }
    }
}

impl Artifact for ImageInfo {
    fn id(&self) -> &str {
        &self.id
    }

    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Truncate an image ID to 12 hex characters, dropping any digest prefix
pub fn short_id(id: &str) -> &str {
    let hex = id.split_once(':').map_or(id, |(_, rest)| rest);
    match hex.char_indices().nth(12) {
        Some((idx, _)) => &hex[..idx],
        None => hex,
    }
}

/// Caller-owned pin token with stable equality
///
/// Keep the value around and pass the same token to `unlock`; a fresh
/// token never matches an earlier pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinToken(Uuid);

impl PinToken {
    /// Generate a new random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing identifier (e.g. a job ID)
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PinToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PinToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
