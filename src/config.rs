//! Configuration management for Guardpost.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{GuardpostError, Result};

/// Main configuration for the Guardpost service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardpostConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Failed-password popularity tracking configuration
    #[serde(default)]
    pub popularity: PopularityConfig,

    /// Per-account credit limits, shortest period first
    #[serde(default = "default_credit_limits")]
    pub credit: Vec<CreditLimitConfig>,

    /// Blocking policy configuration
    #[serde(default)]
    pub blocking: BlockingConfig,

    /// Fleet membership configuration
    #[serde(default)]
    pub cluster: ClusterConfig,
}

impl Default for GuardpostConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            popularity: PopularityConfig::default(),
            credit: default_credit_limits(),
            blocking: BlockingConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,

    /// Default per-attempt deadline applied when a request carries none
    #[serde(default = "default_deadline_ms")]
    pub default_deadline_ms: u64,

    /// Cap on resident per-account credit ledgers before the memory guard
    /// refuses new attempts
    #[serde(default = "default_max_resident_ledgers")]
    pub max_resident_ledgers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
            default_deadline_ms: default_deadline_ms(),
            max_resident_ledgers: default_max_resident_ledgers(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    "127.0.0.1:8081".parse().unwrap()
}

fn default_deadline_ms() -> u64 {
    2000
}

fn default_max_resident_ledgers() -> usize {
    1_000_000
}

/// Configuration for the multi-period popularity trackers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularityConfig {
    /// How many sliding windows to track
    #[serde(default = "default_number_of_periods")]
    pub number_of_periods: u32,

    /// Capacity of the shortest window, in observations
    #[serde(default = "default_shortest_window")]
    pub shortest_window: u32,

    /// Capacity multiplier between successive windows
    #[serde(default = "default_growth_factor")]
    pub growth_factor: u32,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self {
            number_of_periods: default_number_of_periods(),
            shortest_window: default_shortest_window(),
            growth_factor: default_growth_factor(),
        }
    }
}

fn default_number_of_periods() -> u32 {
    4
}

fn default_shortest_window() -> u32 {
    10_000
}

fn default_growth_factor() -> u32 {
    10
}

/// One credit limit: at most `limit` attempts within any trailing window of
/// `period_secs` seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLimitConfig {
    /// Window length in seconds
    pub period_secs: u64,
    /// Attempts admitted within the window
    pub limit: u32,
}

impl CreditLimitConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

/// Reference deployment limits: 3/hour, 6/day, 10/week, 15/month.
fn default_credit_limits() -> Vec<CreditLimitConfig> {
    vec![
        CreditLimitConfig { period_secs: 3_600, limit: 3 },
        CreditLimitConfig { period_secs: 86_400, limit: 6 },
        CreditLimitConfig { period_secs: 604_800, limit: 10 },
        CreditLimitConfig { period_secs: 2_592_000, limit: 15 },
    ]
}

/// Blocking policy configuration.
///
/// Weights align with the popularity vector, largest window first. When fewer
/// weights than periods are configured, the last weight is reused for the
/// remaining periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// Per-period weights applied to popularity proportions
    #[serde(default = "default_popularity_weights")]
    pub popularity_weights: Vec<f64>,

    /// Weighted popularity score at or above which an attempt is blocked
    #[serde(default = "default_block_threshold")]
    pub block_threshold: f64,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            popularity_weights: default_popularity_weights(),
            block_threshold: default_block_threshold(),
        }
    }
}

fn default_popularity_weights() -> Vec<f64> {
    vec![4.0, 2.0, 1.0, 0.5]
}

fn default_block_threshold() -> f64 {
    0.02
}

/// A known fleet member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Unique host key within the fleet
    pub key: String,
    /// gRPC address the host serves attempts on
    pub addr: SocketAddr,
    /// Responsibility weight (share of accounts owned is proportional)
    #[serde(default = "default_host_weight")]
    pub weight: f64,
}

fn default_host_weight() -> f64 {
    1.0
}

/// Fleet membership configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// The key identifying this process among `members`
    #[serde(default = "default_self_key")]
    pub self_key: String,

    /// All known members, including this process
    #[serde(default)]
    pub members: Vec<HostConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            self_key: default_self_key(),
            members: vec![HostConfig {
                key: default_self_key(),
                addr: default_grpc_addr(),
                weight: default_host_weight(),
            }],
        }
    }
}

fn default_self_key() -> String {
    "localhost".to_string()
}

impl GuardpostConfig {
    /// Load configuration from a YAML or JSON file, selected by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config: GuardpostConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .map_err(|e| GuardpostError::Config(e.to_string()))?,
            _ => serde_yaml::from_str(&contents)
                .map_err(|e| GuardpostError::Config(e.to_string()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants the components themselves assume.
    pub fn validate(&self) -> Result<()> {
        if self.popularity.number_of_periods == 0 {
            return Err(GuardpostError::Config(
                "popularity.number_of_periods must be at least 1".into(),
            ));
        }
        if self.popularity.shortest_window == 0 {
            return Err(GuardpostError::Config(
                "popularity.shortest_window must be at least 1".into(),
            ));
        }
        if self.popularity.growth_factor < 2 {
            return Err(GuardpostError::Config(
                "popularity.growth_factor must be at least 2".into(),
            ));
        }

        if self.credit.is_empty() {
            return Err(GuardpostError::Config(
                "at least one credit limit is required".into(),
            ));
        }
        for pair in self.credit.windows(2) {
            if pair[1].period_secs <= pair[0].period_secs {
                return Err(GuardpostError::Config(format!(
                    "credit periods must be strictly increasing ({}s then {}s)",
                    pair[0].period_secs, pair[1].period_secs
                )));
            }
            // A longer window admitting fewer attempts than a shorter one
            // would make the longer window the only one that ever fires.
            if pair[1].limit < pair[0].limit {
                return Err(GuardpostError::Config(format!(
                    "credit limits must be non-decreasing over longer periods ({} then {})",
                    pair[0].limit, pair[1].limit
                )));
            }
        }
        if self.credit.iter().any(|c| c.limit == 0) {
            return Err(GuardpostError::Config(
                "credit limits must be positive".into(),
            ));
        }

        if self.blocking.popularity_weights.is_empty() {
            return Err(GuardpostError::Config(
                "blocking.popularity_weights must not be empty".into(),
            ));
        }
        if self.blocking.popularity_weights.iter().any(|w| *w < 0.0) {
            return Err(GuardpostError::Config(
                "blocking.popularity_weights must be non-negative".into(),
            ));
        }
        if self.blocking.block_threshold <= 0.0 {
            return Err(GuardpostError::Config(
                "blocking.block_threshold must be positive".into(),
            ));
        }

        if !self
            .cluster
            .members
            .iter()
            .any(|m| m.key == self.cluster.self_key)
        {
            return Err(GuardpostError::Config(format!(
                "cluster.self_key '{}' is not among cluster.members",
                self.cluster.self_key
            )));
        }
        if self.cluster.members.iter().any(|m| m.weight <= 0.0) {
            return Err(GuardpostError::Config(
                "cluster member weights must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = GuardpostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.credit.len(), 4);
        assert_eq!(config.credit[0].limit, 3);
        assert_eq!(config.credit[0].period(), Duration::from_secs(3600));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
server:
  grpc_addr: "0.0.0.0:9000"
credit:
  - period_secs: 60
    limit: 2
  - period_secs: 3600
    limit: 5
cluster:
  self_key: "node-a"
  members:
    - key: "node-a"
      addr: "10.0.0.1:9000"
    - key: "node-b"
      addr: "10.0.0.2:9000"
      weight: 2.0
"#;
        let config: GuardpostConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.grpc_addr.port(), 9000);
        assert_eq!(config.credit[1].limit, 5);
        assert_eq!(config.cluster.members[1].weight, 2.0);
        // Unset sections keep their defaults.
        assert_eq!(config.popularity.number_of_periods, 4);
    }

    #[test]
    fn test_non_monotonic_limits_rejected() {
        let mut config = GuardpostConfig::default();
        config.credit = vec![
            CreditLimitConfig { period_secs: 60, limit: 5 },
            CreditLimitConfig { period_secs: 3600, limit: 3 },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decreasing_periods_rejected() {
        let mut config = GuardpostConfig::default();
        config.credit = vec![
            CreditLimitConfig { period_secs: 3600, limit: 3 },
            CreditLimitConfig { period_secs: 60, limit: 6 },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_self_key_rejected() {
        let mut config = GuardpostConfig::default();
        config.cluster.self_key = "not-a-member".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_growth_factor_of_one_rejected() {
        let mut config = GuardpostConfig::default();
        config.popularity.growth_factor = 1;
        assert!(config.validate().is_err());
    }
}
