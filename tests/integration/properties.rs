//! Property tests: random operation sequences against a simple model

use chrono::{DateTime, Duration, Utc};
use imgcache::cache::ManualClock;
use imgcache::{Cache, EvictionOrder, ImageInfo};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Mark(u8),
    Lock(u8, u8),
    Unlock(u8, u8),
    Remove(u8),
    Wait(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Add),
        (0u8..6).prop_map(Op::Mark),
        (0u8..6, 0u8..4).prop_map(|(id, t)| Op::Lock(id, t)),
        (0u8..6, 0u8..4).prop_map(|(id, t)| Op::Unlock(id, t)),
        (0u8..6).prop_map(Op::Remove),
        (1u16..600).prop_map(Op::Wait),
    ]
}

#[derive(Default)]
struct Model {
    uses: HashMap<String, u64>,
    pins: HashMap<String, HashSet<u8>>,
}

fn image_id(n: u8) -> String {
    format!("img-{n}")
}

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn run(ops: &[Op], order: EvictionOrder) -> (Cache<ImageInfo, u8>, Model, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let cache = Cache::with_clock(100, Arc::clone(&clock)).with_order(order);
    let mut model = Model::default();

    for op in ops {
        match *op {
            Op::Add(n) => {
                let id = image_id(n);
                cache.add(ImageInfo::new(id.clone(), u64::from(n) + 1));
                match model.uses.get_mut(&id) {
                    Some(uses) => *uses += 1,
                    None => {
                        model.uses.insert(id.clone(), 0);
                        model.pins.insert(id, HashSet::new());
                    }
                }
            }
            Op::Mark(n) => {
                let id = image_id(n);
                let result = cache.mark(&id);
                match model.uses.get_mut(&id) {
                    Some(uses) => {
                        assert!(result.is_ok());
                        *uses += 1;
                    }
                    None => assert!(result.unwrap_err().is_not_found()),
                }
            }
            Op::Lock(n, token) => {
                let id = image_id(n);
                let result = cache.lock(&id, token);
                match model.pins.get_mut(&id) {
                    Some(pins) => {
                        assert!(result.is_ok());
                        pins.insert(token);
                    }
                    None => assert!(result.unwrap_err().is_not_found()),
                }
            }
            Op::Unlock(n, token) => {
                let id = image_id(n);
                cache.unlock(&id, &token);
                if let Some(pins) = model.pins.get_mut(&id) {
                    pins.remove(&token);
                }
            }
            Op::Remove(n) => {
                let id = image_id(n);
                let result = cache.remove_id(&id);
                if model.uses.remove(&id).is_some() {
                    model.pins.remove(&id);
                    assert!(result.is_ok());
                } else {
                    assert!(result.unwrap_err().is_not_found());
                }
            }
            Op::Wait(secs) => clock.advance(Duration::seconds(i64::from(secs))),
        }
    }

    (cache, model, clock)
}

proptest! {
    #[test]
    fn cache_matches_model(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let (cache, model, _clock) = run(&ops, EvictionOrder::LowestFirst);

        prop_assert_eq!(cache.len(), model.uses.len());
        for (id, uses) in &model.uses {
            let entry = cache.get(id).unwrap();
            prop_assert_eq!(entry.use_count(), *uses);
            prop_assert_eq!(cache.locked(id).unwrap(), !model.pins[id].is_empty());
            prop_assert_eq!(entry.pin_count(), model.pins[id].len());
        }
    }

    #[test]
    fn evictable_excludes_pinned_and_is_sorted(
        ops in prop::collection::vec(op_strategy(), 0..80),
        highest_first in any::<bool>(),
    ) {
        let order = if highest_first {
            EvictionOrder::HighestFirst
        } else {
            EvictionOrder::LowestFirst
        };
        let (cache, model, _clock) = run(&ops, order);

        let ranked = cache.evictable_scored();
        let expected: HashSet<&String> = model
            .pins
            .iter()
            .filter(|(_, pins)| pins.is_empty())
            .map(|(id, _)| id)
            .collect();

        prop_assert_eq!(ranked.len(), expected.len());
        for (_, entry) in &ranked {
            prop_assert!(!entry.is_pinned());
            prop_assert!(expected.contains(&entry.id().to_string()));
        }
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert_ne!(
                order.compare((a.0, a.1.id()), (b.0, b.1.id())),
                std::cmp::Ordering::Greater
            );
        }
    }

    #[test]
    fn total_size_sums_descriptors(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let (cache, model, _clock) = run(&ops, EvictionOrder::LowestFirst);

        let expected: u64 = model
            .uses
            .keys()
            .map(|id| cache.get(id).unwrap().descriptor().size)
            .sum();
        prop_assert_eq!(cache.total_size(), expected);
        prop_assert_eq!(cache.over_filled(), expected > cache.max_size());
    }
}
