//! Popularity estimation across several window sizes at once.

use std::hash::Hash;
use std::time::Duration;
use tokio::time::timeout;

use super::frequency::FrequencyTracker;
use super::proportion::Proportion;
use crate::error::{GuardpostError, Result};

/// A stack of [`FrequencyTracker`]s at geometrically increasing capacities.
///
/// Every observation feeds every window; queries return one proportion per
/// window, **largest window first**. A password popular over a long history
/// but absent from the most recent window is still known-dangerous, so
/// callers conventionally weight the leading entries most heavily.
pub struct MultiperiodFrequencyTracker<K: Eq + Hash + Clone> {
    /// Ordered largest-capacity first.
    trackers: Vec<FrequencyTracker<K>>,
}

impl<K: Eq + Hash + Clone> MultiperiodFrequencyTracker<K> {
    /// Build `number_of_periods` windows with capacities
    /// `shortest_window, shortest_window * growth_factor, ...`.
    pub fn new(number_of_periods: u32, shortest_window: u32, growth_factor: u32) -> Self {
        assert!(number_of_periods > 0, "at least one period is required");
        assert!(shortest_window > 0, "shortest window must be positive");
        assert!(growth_factor >= 2, "growth factor must be at least 2");

        let mut trackers = Vec::with_capacity(number_of_periods as usize);
        let mut capacity = shortest_window as usize;
        for _ in 0..number_of_periods {
            trackers.push(FrequencyTracker::new(capacity));
            capacity *= growth_factor as usize;
        }
        trackers.reverse();

        Self { trackers }
    }

    /// Window capacities in query order (largest first).
    pub fn capacities(&self) -> Vec<usize> {
        self.trackers.iter().map(|t| t.capacity()).collect()
    }

    /// Record one observation of `key` in every window.
    ///
    /// Serialized per underlying window by the tracker's own lock; timing out
    /// surfaces [`GuardpostError::Timeout`] rather than a partial result
    /// reported as success.
    pub async fn record_observation(&self, key: K, deadline: Option<Duration>) -> Result<()> {
        self.bounded(deadline, async {
            for tracker in &self.trackers {
                tracker.observe(key.clone())?;
            }
            Ok(())
        })
        .await
    }

    /// The popularity vector for `key`, one proportion per window, largest
    /// window first. Read-only.
    pub async fn get_frequencies(
        &self,
        key: &K,
        deadline: Option<Duration>,
    ) -> Result<Vec<Proportion>> {
        self.bounded(deadline, async {
            Ok(self.trackers.iter().map(|t| t.get(key)).collect())
        })
        .await
    }

    async fn bounded<T>(
        &self,
        deadline: Option<Duration>,
        work: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match deadline {
            Some(limit) => timeout(limit, work)
                .await
                .map_err(|_| GuardpostError::Timeout(limit))?,
            None => work.await,
        }
    }
}
