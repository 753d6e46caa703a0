//! The shared image cache
//!
//! Every public method takes the single cache-wide lock for a short,
//! bounded critical section. Nothing here performs I/O.

use crate::artifact::{Artifact, PinToken};
use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::{Entry, EvictionOrder};
use crate::cache::size::CacheSizeStatus;
use crate::error::{ImgCacheError, ImgCacheResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Usage-scored, pin-aware cache of resident images
///
/// `A` is the runtime's descriptor type, `T` the caller's pin token type.
/// Construct one per process and share it by reference or `Arc`.
pub struct Cache<A, T = PinToken> {
    entries: Mutex<HashMap<String, Entry<A, T>>>,
    max_size: u64,
    order: EvictionOrder,
    clock: Box<dyn Clock>,
}

impl<A: Artifact, T: Eq + Hash> Cache<A, T> {
    /// Create an empty cache holding at most `max_size` bytes before it
    /// reports itself over-filled
    pub fn new(max_size: u64) -> Self {
        Self::with_clock(max_size, SystemClock)
    }

    /// Create an empty cache reading time from `clock`
    pub fn with_clock(max_size: u64, clock: impl Clock + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
            order: EvictionOrder::default(),
            clock: Box::new(clock),
        }
    }

    /// Rank `evictable` results in the given direction
    pub fn with_order(mut self, order: EvictionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn order(&self) -> EvictionOrder {
        self.order
    }

    /// Whether an entry with the descriptor's identity exists
    pub fn contains(&self, descriptor: &A) -> bool {
        self.contains_id(descriptor.id())
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Start tracking an image, or record a use if it is already tracked
    pub fn add(&self, descriptor: A) {
        let mut entries = self.entries.lock();
        let now = self.clock.now();

        if let Some(entry) = entries.get_mut(descriptor.id()) {
            entry.touch(now);
            debug!(
                "Re-added image {}, uses now {}",
                entry.id(),
                entry.use_count()
            );
            return;
        }

        debug!(
            "Tracking image {} ({} bytes)",
            descriptor.id(),
            descriptor.size_bytes()
        );
        let id = descriptor.id().to_string();
        entries.insert(id, Entry::new(descriptor, now));
    }

    /// Record a use of the image with this identity
    pub fn mark(&self, id: &str) -> ImgCacheResult<()> {
        let mut entries = self.entries.lock();
        let now = self.clock.now();

        let entry = entries
            .get_mut(id)
            .ok_or_else(|| ImgCacheError::not_found(id))?;
        entry.touch(now);

        debug!("Marked image {}, uses now {}", id, entry.use_count());
        Ok(())
    }

    /// Stop tracking an image.
    ///
    /// Pins are not consulted: callers decide what to delete after checking
    /// `evictable` or `locked`.
    pub fn remove(&self, descriptor: &A) -> ImgCacheResult<()> {
        self.remove_id(descriptor.id())
    }

    pub fn remove_id(&self, id: &str) -> ImgCacheResult<()> {
        let removed = self
            .entries
            .lock()
            .remove(id)
            .ok_or_else(|| ImgCacheError::not_found(id))?;

        if removed.is_pinned() {
            debug!(
                "Removed image {} while it still held {} pin(s)",
                id,
                removed.pin_count()
            );
        } else {
            debug!("Removed image {}", id);
        }
        Ok(())
    }

    /// Pin an image on behalf of `token`. Any number of distinct tokens may
    /// pin the same image.
    pub fn lock(&self, id: &str, token: T) -> ImgCacheResult<()> {
        let mut entries = self.entries.lock();

        let entry = entries
            .get_mut(id)
            .ok_or_else(|| ImgCacheError::not_found(id))?;
        if entry.pin(token) {
            debug!("Pinned image {}, pins now {}", id, entry.pin_count());
        } else {
            debug!("Image {} already pinned by this token", id);
        }
        Ok(())
    }

    /// Whether any token currently pins the image
    pub fn locked(&self, id: &str) -> ImgCacheResult<bool> {
        self.entries
            .lock()
            .get(id)
            .map(Entry::is_pinned)
            .ok_or_else(|| ImgCacheError::not_found(id))
    }

    /// Release the pin held by `token`.
    ///
    /// Unknown images and tokens are ignored, since the image may have been
    /// removed concurrently.
    pub fn unlock(&self, id: &str, token: &T) {
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get_mut(id) else {
            debug!("Unlock of untracked image {}", id);
            return;
        };

        if entry.unpin(token) {
            debug!("Unpinned image {}, pins now {}", id, entry.pin_count());
        } else {
            debug!("Unlock of image {} with a token that holds no pin", id);
        }
    }

    /// Sum of descriptor-reported sizes of every tracked image
    pub fn total_size(&self) -> u64 {
        total_size(&self.entries.lock())
    }

    /// Whether the tracked images together exceed the configured limit
    pub fn over_filled(&self) -> bool {
        total_size(&self.entries.lock()) > self.max_size
    }

    pub fn size_status(&self) -> CacheSizeStatus {
        CacheSizeStatus::from_usage(self.total_size(), self.max_size)
    }

    /// Identities of every pinned image, sorted
    pub fn pinned(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .lock()
            .values()
            .filter(|e| e.is_pinned())
            .map(|e| e.id().to_string())
            .collect();
        ids.sort();
        ids
    }
}

impl<A: Artifact + Clone, T: Eq + Hash + Clone> Cache<A, T> {
    /// Snapshot of one entry
    pub fn get(&self, id: &str) -> Option<Entry<A, T>> {
        self.entries.lock().get(id).cloned()
    }

    /// Unpinned entries ranked by score, most evictable first.
    ///
    /// This is a copy taken at one instant; it goes stale as soon as the
    /// lock is released. Nothing is removed from the cache.
    pub fn evictable(&self) -> Vec<Entry<A, T>> {
        self.evictable_scored()
            .into_iter()
            .map(|(_, entry)| entry)
            .collect()
    }

    /// Like `evictable`, paired with each entry's score at the ranking instant
    pub fn evictable_scored(&self) -> Vec<(f64, Entry<A, T>)> {
        let entries = self.entries.lock();
        let now = self.clock.now();
        let mut ranked: Vec<(f64, Entry<A, T>)> = entries
            .values()
            .filter(|e| !e.is_pinned())
            .map(|e| (e.score_at(now), e.clone()))
            .collect();
        drop(entries);

        ranked.sort_by(|(sa, a), (sb, b)| self.order.compare((*sa, a.id()), (*sb, b.id())));
        ranked
    }
}

fn total_size<A: Artifact, T: Eq + Hash>(entries: &HashMap<String, Entry<A, T>>) -> u64 {
    entries
        .values()
        .map(|e| e.descriptor().size_bytes())
        .fold(0u64, u64::saturating_add)
}
