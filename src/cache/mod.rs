//! Pinned-resource eviction cache for container images
//!
//! Tracks the images resident on a worker, how often and how recently each
//! was used, and which ones in-flight work has pinned. The cache never pulls
//! or deletes anything itself: callers ask for a ranking and act on it.
//!
//! # Lifecycle
//!
//! | Call | Effect |
//! |------|--------|
//! | `add` | Track a new image, or count a use of a known one |
//! | `mark` | Count a use and refresh the last-used time |
//! | `lock` / `unlock` | Take or release a pin for a caller token |
//! | `evictable` | Ranked snapshot of unpinned images |
//! | `remove` | Stop tracking (pins are not checked) |
//!
//! # Scoring
//!
//! `score = seconds idle since last use / use count`. An image that has
//! never been used since it was added scores infinity. The default ranking
//! puts the lowest score first; `EvictionOrder::HighestFirst` flips it.

pub mod clock;
pub mod entry;
pub mod size;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{Entry, EvictionOrder};
pub use size::{format_bytes, gb_to_bytes, CacheSizeStatus};
pub use store::Cache;
