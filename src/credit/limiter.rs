//! Multi-period credit limiting.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

use crate::config::CreditLimitConfig;

/// One budget: at most `limit` units consumed within any trailing window of
/// `period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitPerTimePeriod {
    pub period: Duration,
    pub limit: u32,
}

impl From<&CreditLimitConfig> for LimitPerTimePeriod {
    fn from(config: &CreditLimitConfig) -> Self {
        Self {
            period: Duration::seconds(config.period_secs as i64),
            limit: config.limit,
        }
    }
}

/// Outcome of a consumption check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Every configured period had headroom; credit was consumed in all of
    /// them.
    Allowed,
    /// At least one period was exhausted; nothing was consumed anywhere.
    /// The reported period is the shortest exhausted one, for diagnostics
    /// only; callers treat all denials uniformly.
    Denied { period: Duration },
}

impl ConsumeOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, ConsumeOutcome::Denied { .. })
    }
}

/// Tracks per-account consumption against every configured period at once.
///
/// An attempt consumes credit in all periods or none: the per-account ledger
/// sits behind a single mutex, so two racing attempts for the same account
/// serialize and the multi-period update is atomic. Windows are trailing:
/// a consumption only stops counting once it is older than the period, never
/// earlier, so a denial holds until time genuinely passes.
pub struct CreditLimiter {
    /// Configured shortest period first.
    limits: Vec<LimitPerTimePeriod>,
    /// Per-account consumption timestamps, one deque per configured period.
    ledgers: DashMap<String, Mutex<Vec<VecDeque<DateTime<Utc>>>>>,
}

impl CreditLimiter {
    pub fn new(limits: Vec<LimitPerTimePeriod>) -> Self {
        assert!(!limits.is_empty(), "at least one credit limit is required");
        Self {
            limits,
            ledgers: DashMap::new(),
        }
    }

    pub fn from_config(configs: &[CreditLimitConfig]) -> Self {
        Self::new(configs.iter().map(LimitPerTimePeriod::from).collect())
    }

    /// The configured limits, shortest period first.
    pub fn limits(&self) -> &[LimitPerTimePeriod] {
        &self.limits
    }

    /// Consume `cost` units of credit for `account_id` in every period, or
    /// deny without consuming anything if any period lacks headroom.
    pub fn try_consume(&self, account_id: &str, cost: u32) -> ConsumeOutcome {
        self.try_consume_at(account_id, cost, Utc::now())
    }

    /// Number of accounts with a resident ledger.
    pub fn ledger_count(&self) -> usize {
        self.ledgers.len()
    }

    /// Drop ledgers whose every window has fully drained.
    ///
    /// Safe to run at any time: an empty ledger is indistinguishable from an
    /// absent one.
    pub fn prune(&self) {
        self.prune_at(Utc::now());
    }

    fn try_consume_at(&self, account_id: &str, cost: u32, now: DateTime<Utc>) -> ConsumeOutcome {
        let entry = self
            .ledgers
            .entry(account_id.to_string())
            .or_insert_with(|| Mutex::new(vec![VecDeque::new(); self.limits.len()]));
        let mut windows = entry.lock();

        // Expire consumptions that have aged out of each window.
        for (window, limit) in windows.iter_mut().zip(&self.limits) {
            while window
                .front()
                .is_some_and(|t| now.signed_duration_since(*t) >= limit.period)
            {
                window.pop_front();
            }
        }

        // All periods must have headroom before anything is consumed.
        for (window, limit) in windows.iter().zip(&self.limits) {
            if window.len() as u64 + cost as u64 > limit.limit as u64 {
                debug!(
                    account = account_id,
                    period_secs = limit.period.num_seconds(),
                    consumed = window.len(),
                    limit = limit.limit,
                    "Credit denied"
                );
                return ConsumeOutcome::Denied {
                    period: limit.period,
                };
            }
        }

        for window in windows.iter_mut() {
            for _ in 0..cost {
                window.push_back(now);
            }
        }

        ConsumeOutcome::Allowed
    }

    fn prune_at(&self, now: DateTime<Utc>) {
        self.ledgers.retain(|_, ledger| {
            let windows = ledger.lock();
            windows.iter().zip(&self.limits).any(|(window, limit)| {
                window
                    .back()
                    .is_some_and(|t| now.signed_duration_since(*t) < limit.period)
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(pairs: &[(i64, u32)]) -> Vec<LimitPerTimePeriod> {
        pairs
            .iter()
            .map(|(secs, limit)| LimitPerTimePeriod {
                period: Duration::seconds(*secs),
                limit: *limit,
            })
            .collect()
    }

    #[test]
    fn test_hourly_limit_fires_before_daily() {
        // Limits {1h: 3, 1d: 6}: three attempts in the same hour pass, the
        // fourth is denied even though the daily count is under 6.
        let limiter = CreditLimiter::new(limits(&[(3_600, 3), (86_400, 6)]));
        let t0 = Utc::now();

        for i in 0..3 {
            let at = t0 + Duration::minutes(i * 10);
            assert_eq!(limiter.try_consume_at("alice", 1, at), ConsumeOutcome::Allowed);
        }

        let denied = limiter.try_consume_at("alice", 1, t0 + Duration::minutes(40));
        assert_eq!(
            denied,
            ConsumeOutcome::Denied {
                period: Duration::seconds(3_600)
            }
        );
    }

    #[test]
    fn test_denial_holds_until_window_drains() {
        let limiter = CreditLimiter::new(limits(&[(3_600, 2)]));
        let t0 = Utc::now();

        assert!(!limiter.try_consume_at("bob", 1, t0).is_denied());
        assert!(!limiter.try_consume_at("bob", 1, t0).is_denied());

        // Denied at every probe short of the window edge.
        for minutes in [1, 30, 59] {
            assert!(limiter
                .try_consume_at("bob", 1, t0 + Duration::minutes(minutes))
                .is_denied());
        }

        // The first consumption ages out exactly one hour after t0.
        assert!(!limiter
            .try_consume_at("bob", 1, t0 + Duration::minutes(60))
            .is_denied());
    }

    #[test]
    fn test_longer_period_can_deny_when_shorter_allows() {
        let limiter = CreditLimiter::new(limits(&[(60, 2), (3_600, 3)]));
        let t0 = Utc::now();

        assert!(!limiter.try_consume_at("carol", 1, t0).is_denied());
        assert!(!limiter
            .try_consume_at("carol", 1, t0 + Duration::minutes(5))
            .is_denied());
        assert!(!limiter
            .try_consume_at("carol", 1, t0 + Duration::minutes(10))
            .is_denied());

        // The per-minute window is clear, but the hourly budget of 3 is gone.
        let denied = limiter.try_consume_at("carol", 1, t0 + Duration::minutes(15));
        assert_eq!(
            denied,
            ConsumeOutcome::Denied {
                period: Duration::seconds(3_600)
            }
        );
    }

    #[test]
    fn test_denial_consumes_nothing() {
        let limiter = CreditLimiter::new(limits(&[(60, 1), (3_600, 10)]));
        let t0 = Utc::now();

        assert!(!limiter.try_consume_at("dave", 1, t0).is_denied());
        // Denied by the minute window; the hourly window must not record it.
        assert!(limiter.try_consume_at("dave", 1, t0).is_denied());

        // Once the minute window clears, the hourly budget still has 9 left:
        // all of them must be admittable.
        let mut admitted = 0;
        for i in 0..9 {
            let at = t0 + Duration::seconds(61 + i * 61);
            if !limiter.try_consume_at("dave", 1, at).is_denied() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 9);
    }

    #[test]
    fn test_accounts_are_independent() {
        let limiter = CreditLimiter::new(limits(&[(3_600, 1)]));
        let t0 = Utc::now();

        assert!(!limiter.try_consume_at("erin", 1, t0).is_denied());
        assert!(limiter.try_consume_at("erin", 1, t0).is_denied());
        assert!(!limiter.try_consume_at("frank", 1, t0).is_denied());
    }

    #[test]
    fn test_cost_above_remaining_budget_denied() {
        let limiter = CreditLimiter::new(limits(&[(3_600, 3)]));
        let t0 = Utc::now();

        assert!(!limiter.try_consume_at("grace", 2, t0).is_denied());
        assert!(limiter.try_consume_at("grace", 2, t0).is_denied());
        assert!(!limiter.try_consume_at("grace", 1, t0).is_denied());
    }

    #[test]
    fn test_prune_drops_only_drained_ledgers() {
        let limiter = CreditLimiter::new(limits(&[(60, 5)]));
        let t0 = Utc::now();

        limiter.try_consume_at("old", 1, t0 - Duration::minutes(10));
        limiter.try_consume_at("fresh", 1, t0);
        assert_eq!(limiter.ledger_count(), 2);

        limiter.prune_at(t0);
        assert_eq!(limiter.ledger_count(), 1);

        // Pruning never re-admits early: "fresh" still has its consumption.
        limiter.try_consume_at("fresh", 1, t0);
        for _ in 0..3 {
            limiter.try_consume_at("fresh", 1, t0);
        }
        assert!(limiter.try_consume_at("fresh", 1, t0).is_denied());
    }

    #[test]
    fn test_from_config_order_preserved() {
        let configs = vec![
            CreditLimitConfig { period_secs: 3_600, limit: 3 },
            CreditLimitConfig { period_secs: 86_400, limit: 6 },
        ];
        let limiter = CreditLimiter::from_config(&configs);
        assert_eq!(limiter.limits()[0].period, Duration::seconds(3_600));
        assert_eq!(limiter.limits()[1].limit, 6);
    }
}
