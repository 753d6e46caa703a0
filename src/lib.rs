//! imgcache - pinned-resource eviction cache for container images
//!
//! Tracks images resident on a worker, scores them by idle time per use,
//! and keeps images pinned by in-flight work out of the eviction ranking.

pub mod artifact;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod replay;

pub use artifact::{Artifact, ImageInfo, PinToken};
pub use cache::{Cache, Entry, EvictionOrder};
pub use error::{ImgCacheError, ImgCacheResult};
