//! Fleet member identity.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::config::HostConfig;

/// A participant in responsibility assignment: something with a stable
/// identity and a weight proportional to the share of keys it should own.
pub trait ShardMember {
    /// Stable identity, consistent across restarts of every fleet member.
    fn identity(&self) -> &str;

    /// Relative share of keys this member should win.
    fn weight(&self) -> f64;
}

/// A host in the guardpost fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteHost {
    /// Unique host key within the fleet
    pub key: String,
    /// gRPC address attempts are forwarded to
    pub addr: SocketAddr,
    /// Responsibility weight
    pub weight: f64,
}

impl RemoteHost {
    pub fn new(key: impl Into<String>, addr: SocketAddr, weight: f64) -> Self {
        Self {
            key: key.into(),
            addr,
            weight,
        }
    }

    /// The endpoint URI used when forwarding attempts to this host.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl ShardMember for RemoteHost {
    fn identity(&self) -> &str {
        &self.key
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

impl From<&HostConfig> for RemoteHost {
    fn from(config: &HostConfig) -> Self {
        Self {
            key: config.key.clone(),
            addr: config.addr,
            weight: config.weight,
        }
    }
}
