//! Popularity-based blocking policy.

use tracing::trace;

use crate::config::BlockingConfig;
use crate::tracking::Proportion;

/// Decides whether a popularity vector alone warrants blocking.
///
/// The engine OR-s this verdict with credit denial itself, so no policy can
/// un-block an attempt whose credit is exhausted. The formula combining the
/// vector is deployment policy, not engine contract.
pub trait BlockingPolicy: Send + Sync {
    /// `popularity` is ordered largest window first.
    fn should_block(&self, popularity: &[Proportion]) -> bool;
}

/// Reference policy: a weighted sum over the popularity vector compared
/// against a threshold.
///
/// Weights align with the largest-first vector; when fewer weights than
/// periods are configured the last weight is reused for the tail. With a
/// positive threshold, an all-zero vector can never block.
pub struct WeightedThresholdPolicy {
    weights: Vec<f64>,
    threshold: f64,
}

impl WeightedThresholdPolicy {
    pub fn new(weights: Vec<f64>, threshold: f64) -> Self {
        assert!(!weights.is_empty(), "at least one weight is required");
        assert!(threshold > 0.0, "threshold must be positive");
        Self { weights, threshold }
    }

    pub fn from_config(config: &BlockingConfig) -> Self {
        Self::new(config.popularity_weights.clone(), config.block_threshold)
    }

    fn score(&self, popularity: &[Proportion]) -> f64 {
        let last_weight = *self.weights.last().expect("weights are non-empty");
        popularity
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let weight = self.weights.get(i).copied().unwrap_or(last_weight);
                weight * p.as_f64()
            })
            .sum()
    }
}

impl BlockingPolicy for WeightedThresholdPolicy {
    fn should_block(&self, popularity: &[Proportion]) -> bool {
        let score = self.score(popularity);
        trace!(score, threshold = self.threshold, "Scored popularity vector");
        score >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_popularity_never_blocks() {
        let policy = WeightedThresholdPolicy::new(vec![4.0, 2.0, 1.0], 0.001);
        let zeros = vec![
            Proportion::zero(1000),
            Proportion::zero(100),
            Proportion::zero(10),
        ];
        assert!(!policy.should_block(&zeros));
        assert!(!policy.should_block(&[]));
    }

    #[test]
    fn test_popular_password_blocks() {
        let policy = WeightedThresholdPolicy::new(vec![4.0, 2.0, 1.0], 0.05);
        // 2% of the long window: 4.0 * 0.02 = 0.08 >= 0.05.
        let popularity = vec![
            Proportion::new(20, 1000),
            Proportion::zero(100),
            Proportion::zero(10),
        ];
        assert!(policy.should_block(&popularity));
    }

    #[test]
    fn test_rare_password_stays_under_threshold() {
        let policy = WeightedThresholdPolicy::new(vec![4.0, 2.0, 1.0], 0.05);
        let popularity = vec![
            Proportion::new(1, 1000),
            Proportion::new(1, 100),
            Proportion::zero(10),
        ];
        assert!(!policy.should_block(&popularity));
    }

    #[test]
    fn test_last_weight_covers_unconfigured_tail() {
        let policy = WeightedThresholdPolicy::new(vec![1.0], 0.5);
        // Second entry uses the only configured weight.
        let popularity = vec![Proportion::zero(100), Proportion::new(6, 10)];
        assert!(policy.should_block(&popularity));
    }

    #[test]
    fn test_from_config_defaults() {
        let policy = WeightedThresholdPolicy::from_config(&BlockingConfig::default());
        assert!(!policy.should_block(&[Proportion::zero(10_000)]));
    }
}
