//! Event log replay
//!
//! Drives a cache from a recorded JSON-lines log of agent activity and
//! reports the resulting eviction ranking. One event per line:
//!
//! ```text
//! {"op":"add","image":{"id":"sha256:aa..","size":1024},"at":"2024-01-15T10:00:00Z"}
//! {"op":"mark","id":"sha256:aa..","at":"2024-01-15T10:05:00Z"}
//! {"op":"lock","id":"sha256:aa..","token":"job-17"}
//! {"op":"unlock","id":"sha256:aa..","token":"job-17"}
//! {"op":"remove","id":"sha256:aa.."}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Events without an
//! `at` happen at the time of the previous event.

use crate::artifact::ImageInfo;
use crate::cache::{Cache, CacheSizeStatus, Clock, EvictionOrder, ManualClock};
use crate::error::{ImgCacheError, ImgCacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// One recorded cache operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    /// When the operation happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub op: ReplayOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ReplayOp {
    Add { image: ImageInfo },
    Mark { id: String },
    Lock { id: String, token: String },
    Unlock { id: String, token: String },
    Remove { id: String },
}

impl ReplayOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Mark { .. } => "mark",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Parse a JSON-lines event log, keeping 1-based line numbers
pub fn parse_events(content: &str) -> ImgCacheResult<Vec<(usize, ReplayEvent)>> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line)
                .map(|event| (line_no, event))
                .map_err(|e| ImgCacheError::ReplayParse {
                    line: line_no,
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Read and parse an event log file
pub async fn read_events(path: &Path) -> ImgCacheResult<Vec<(usize, ReplayEvent)>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ImgCacheError::io(format!("reading event log {}", path.display()), e))?;
    parse_events(&content)
}

/// An unpinned image in ranking order
#[derive(Debug, Clone, Serialize)]
pub struct RankedImage {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub size: u64,
    pub uses: u64,
    pub last_used_at: DateTime<Utc>,
    /// Idle seconds per use; `None` when the image was never used after being added
    pub score: Option<f64>,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub applied: usize,
    pub failed: usize,
    pub evaluated_at: DateTime<Utc>,
    pub order: EvictionOrder,
    pub tracked: usize,
    pub total_size: u64,
    pub max_size: u64,
    pub size_status: CacheSizeStatus,
    pub over_filled: bool,
    pub pinned: Vec<String>,
    pub evictable: Vec<RankedImage>,
}

/// Applies events to a cache whose clock follows the event timestamps
pub struct Replayer {
    cache: Cache<ImageInfo, String>,
    clock: Arc<ManualClock>,
    strict: bool,
    applied: usize,
    failed: usize,
}

impl Replayer {
    pub fn new(max_size: u64, order: EvictionOrder, start: DateTime<Utc>) -> Self {
        let clock = Arc::new(ManualClock::new(start));
        Self {
            cache: Cache::with_clock(max_size, Arc::clone(&clock)).with_order(order),
            clock,
            strict: false,
            applied: 0,
            failed: 0,
        }
    }

    /// Abort on the first event that references an untracked image
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn cache(&self) -> &Cache<ImageInfo, String> {
        &self.cache
    }

    /// Apply one event. Not-found results are counted and skipped unless strict.
    pub fn apply(&mut self, line: usize, event: ReplayEvent) -> ImgCacheResult<()> {
        if let Some(at) = event.at {
            self.clock.set(at);
        }
        let op_name = event.op.name();

        let result = match event.op {
            ReplayOp::Add { image } => {
                self.cache.add(image);
                Ok(())
            }
            ReplayOp::Mark { id } => self.cache.mark(&id),
            ReplayOp::Lock { id, token } => self.cache.lock(&id, token),
            ReplayOp::Unlock { id, token } => {
                self.cache.unlock(&id, &token);
                Ok(())
            }
            ReplayOp::Remove { id } => self.cache.remove_id(&id),
        };

        match result {
            Ok(()) => {
                self.applied += 1;
                Ok(())
            }
            Err(e) if e.is_not_found() && !self.strict => {
                warn!("Line {}: skipping {}: {}", line, op_name, e);
                self.failed += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply every event in order
    pub fn apply_all(
        &mut self,
        events: impl IntoIterator<Item = (usize, ReplayEvent)>,
    ) -> ImgCacheResult<()> {
        for (line, event) in events {
            self.apply(line, event)?;
        }
        debug!(
            "Replayed {} event(s), {} skipped",
            self.applied, self.failed
        );
        Ok(())
    }

    /// Rank the cache as of `at`, or as of the last event when `None`
    pub fn report(&self, at: Option<DateTime<Utc>>) -> ReplayReport {
        if let Some(at) = at {
            self.clock.set(at);
        }
        let evaluated_at = self.clock.now();

        let evictable: Vec<RankedImage> = self
            .cache
            .evictable_scored()
            .into_iter()
            .enumerate()
            .map(|(idx, (score, entry))| RankedImage {
                rank: idx + 1,
                id: entry.id().to_string(),
                name: entry.descriptor().display_name().to_string(),
                size: entry.descriptor().size,
                uses: entry.use_count(),
                last_used_at: entry.last_used_at(),
                score: score.is_finite().then_some(score),
            })
            .collect();

        let report = ReplayReport {
            applied: self.applied,
            failed: self.failed,
            evaluated_at,
            order: self.cache.order(),
            tracked: self.cache.len(),
            total_size: self.cache.total_size(),
            max_size: self.cache.max_size(),
            size_status: self.cache.size_status(),
            over_filled: self.cache.over_filled(),
            pinned: self.cache.pinned(),
            evictable,
        };

        info!(
            "{} image(s) tracked, {} evictable, {} pinned",
            report.tracked,
            report.evictable.len(),
            report.pinned.len()
        );
        report
    }
}

/// Start time for a replay: the first timestamped event, else now
pub fn start_time(events: &[(usize, ReplayEvent)]) -> DateTime<Utc> {
    events
        .iter()
        .find_map(|(_, e)| e.at)
        .unwrap_or_else(Utc::now)
}
