//! Exact sliding-window occurrence counting.

use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::error;

use super::proportion::Proportion;
use crate::error::{GuardpostError, Result};

/// Counts how often each key appeared among the last `capacity` observations.
///
/// State is a bounded sequence of the observed keys plus a count map over it.
/// Invariant: `counts[k]` equals the number of occurrences of `k` in the
/// sequence, and the sequence never exceeds `capacity`. Memory is O(capacity)
/// regardless of traffic volume.
///
/// A single mutex guards both structures: one mutation path, many short read
/// paths, so concurrent `observe` calls for the same key stream serialize and
/// a `get` never sees a half-applied eviction.
pub struct FrequencyTracker<K: Eq + Hash + Clone> {
    capacity: usize,
    state: Mutex<TrackerState<K>>,
}

struct TrackerState<K> {
    sequence: VecDeque<K>,
    counts: HashMap<K, u64>,
    /// Set when an invariant violation is detected. The tracker refuses
    /// further observations rather than silently resetting.
    corrupt: bool,
}

impl<K: Eq + Hash + Clone> FrequencyTracker<K> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "tracker capacity must be positive");
        Self {
            capacity,
            state: Mutex::new(TrackerState {
                sequence: VecDeque::with_capacity(capacity),
                counts: HashMap::new(),
                corrupt: false,
            }),
        }
    }

    /// Window capacity, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record one observation of `key`, evicting the oldest observation once
    /// the window is full.
    pub fn observe(&self, key: K) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.corrupt {
            return Err(GuardpostError::CorruptState(
                "frequency tracker previously detected an invariant violation".into(),
            ));
        }

        if state.sequence.len() == self.capacity {
            let evicted = state
                .sequence
                .pop_front()
                .expect("full sequence cannot be empty");

            match state.counts.entry(evicted) {
                Entry::Occupied(mut entry) => {
                    if *entry.get() > 1 {
                        *entry.get_mut() -= 1;
                    } else {
                        entry.remove();
                    }
                }
                Entry::Vacant(_) => {
                    // The count map lost an entry the sequence still holds.
                    state.corrupt = true;
                    error!("frequency tracker count map missing entry for evicted key");
                    return Err(GuardpostError::CorruptState(
                        "evicted key had no count entry".into(),
                    ));
                }
            }
        }

        state.sequence.push_back(key.clone());
        *state.counts.entry(key).or_insert(0) += 1;

        Ok(())
    }

    /// Occurrences of `key` within the window, over the window capacity.
    ///
    /// Never mutates; the denominator is the capacity even before the window
    /// has filled.
    pub fn get(&self, key: &K) -> Proportion {
        let state = self.state.lock();
        let count = state.counts.get(key).copied().unwrap_or(0);
        Proportion::new(count, self.capacity as u64)
    }

    /// Number of observations currently held (at most `capacity`).
    pub fn len(&self) -> usize {
        self.state.lock().sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_shifts_counts() {
        // Capacity-3 window: [a, a, b] then observe c.
        let tracker = FrequencyTracker::new(3);
        tracker.observe("a").unwrap();
        tracker.observe("a").unwrap();
        tracker.observe("b").unwrap();

        assert_eq!(tracker.get(&"a"), Proportion::new(2, 3));

        tracker.observe("c").unwrap();

        // Sequence is now [a, b, c].
        assert_eq!(tracker.get(&"a"), Proportion::new(1, 3));
        assert_eq!(tracker.get(&"b"), Proportion::new(1, 3));
        assert_eq!(tracker.get(&"c"), Proportion::new(1, 3));
    }

    #[test]
    fn test_denominator_is_capacity_before_window_fills() {
        let tracker = FrequencyTracker::new(100);
        assert_eq!(tracker.get(&"x"), Proportion::zero(100));

        tracker.observe("x").unwrap();
        assert_eq!(tracker.get(&"x"), Proportion::new(1, 100));
    }

    #[test]
    fn test_evicted_key_reads_as_zero() {
        let tracker = FrequencyTracker::new(2);
        tracker.observe("old").unwrap();
        tracker.observe("a").unwrap();
        tracker.observe("b").unwrap();

        // "old" fell out of the window; indistinguishable from never seen.
        assert_eq!(tracker.get(&"old"), Proportion::zero(2));
    }

    #[test]
    fn test_window_exactness_against_reference() {
        let capacity = 7;
        let tracker = FrequencyTracker::new(capacity);
        let keys = ["a", "b", "a", "c", "a", "b", "d", "a", "e", "b", "b", "c"];

        let mut reference: Vec<&str> = Vec::new();
        for key in keys {
            tracker.observe(key).unwrap();
            reference.push(key);

            let window_start = reference.len().saturating_sub(capacity);
            let window = &reference[window_start..];
            for probe in ["a", "b", "c", "d", "e"] {
                let expected = window.iter().filter(|k| **k == probe).count() as u64;
                assert_eq!(
                    tracker.get(&probe),
                    Proportion::new(expected, capacity as u64),
                    "mismatch for {probe} after {} observations",
                    reference.len()
                );
            }
        }
    }

    #[test]
    fn test_count_sum_matches_sequence_length() {
        let tracker = FrequencyTracker::new(5);
        for key in ["a", "b", "a", "a", "c", "b", "a"] {
            tracker.observe(key).unwrap();
        }

        let state = tracker.state.lock();
        let total: u64 = state.counts.values().sum();
        assert_eq!(total, state.sequence.len() as u64);
        assert_eq!(state.sequence.len(), 5);
    }

    #[test]
    fn test_concurrent_observers_preserve_totals() {
        use std::sync::Arc;

        let tracker = Arc::new(FrequencyTracker::new(1000));
        let mut handles = Vec::new();
        for t in 0..4 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for i in 0..250 {
                    tracker.observe(format!("key-{}", (t * 250 + i) % 10)).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 1000 observations over 10 keys with capacity 1000: each key
        // appears exactly 100 times.
        for i in 0..10 {
            assert_eq!(tracker.get(&format!("key-{i}")).count, 100);
        }
    }
}
