//! Tracked entries and eviction scoring

use crate::artifact::Artifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// One tracked artifact
///
/// Returned to callers as a snapshot; mutating a returned entry has no
/// effect on the cache.
#[derive(Debug, Clone)]
pub struct Entry<A, T> {
    descriptor: A,
    last_used_at: DateTime<Utc>,
    use_count: u64,
    pins: HashSet<T>,
}

impl<A: Artifact, T: Eq + Hash> Entry<A, T> {
    pub(crate) fn new(descriptor: A, now: DateTime<Utc>) -> Self {
        Self {
            descriptor,
            last_used_at: now,
            use_count: 0,
            pins: HashSet::new(),
        }
    }

    /// Record one use
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used_at = now;
        self.use_count = self.use_count.saturating_add(1);
    }

    /// Returns false if the token already held a pin
    pub(crate) fn pin(&mut self, token: T) -> bool {
        self.pins.insert(token)
    }

    /// Returns false if the token held no pin
    pub(crate) fn unpin(&mut self, token: &T) -> bool {
        self.pins.remove(token)
    }

    pub fn id(&self) -> &str {
        self.descriptor.id()
    }

    /// Runtime-supplied descriptor, stored verbatim
    pub fn descriptor(&self) -> &A {
        &self.descriptor
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    /// Number of uses recorded since the entry was created
    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn is_pinned(&self) -> bool {
        !self.pins.is_empty()
    }

    pub fn is_pinned_by(&self, token: &T) -> bool {
        self.pins.contains(token)
    }

    /// Idle seconds per recorded use.
    ///
    /// An entry that was added but never used again scores infinity and
    /// ranks ahead of every scored entry.
    /// A `now` earlier than the last use counts as zero idle time.
    pub fn score_at(&self, now: DateTime<Utc>) -> f64 {
        if self.use_count == 0 {
            return f64::INFINITY;
        }
        let idle = (now - self.last_used_at)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();
        idle / self.use_count as f64
    }
}

/// Direction in which `Cache::evictable` ranks scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionOrder {
    /// Lowest score first
    #[default]
    LowestFirst,
    /// Highest score first: long idle, rarely used images lead
    HighestFirst,
}

impl EvictionOrder {
    /// Compare two scored identities.
    ///
    /// Infinite scores (never used after being added) lead in both
    /// directions. Equal scores fall back to identity order.
    pub fn compare(&self, a: (f64, &str), b: (f64, &str)) -> Ordering {
        let unused_first = b.0.is_infinite().cmp(&a.0.is_infinite());
        let by_score = match self {
            Self::LowestFirst => a.0.total_cmp(&b.0),
            Self::HighestFirst => b.0.total_cmp(&a.0),
        };
        unused_first
            .then(by_score)
            .then_with(|| a.1.cmp(b.1))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowestFirst => "lowest-first",
            Self::HighestFirst => "highest-first",
        }
    }
}

impl fmt::Display for EvictionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowest-first" => Ok(Self::LowestFirst),
            "highest-first" => Ok(Self::HighestFirst),
            other => Err(format!(
                "invalid eviction order: {other} (expected lowest-first or highest-first)"
            )),
        }
    }
}
