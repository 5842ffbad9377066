//! Forwarding client carrying attempts to their owning host.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request};
use tracing::{debug, warn};

use super::proto::login_blocking_client::LoginBlockingClient;
use super::proto::CheckAttemptRequest;
use crate::blocking::{AttemptForwarder, AttemptOutcome, AttemptRequest};
use crate::error::{GuardpostError, Result};
use crate::sharding::RemoteHost;

/// Forwards attempts over tonic, one cached channel per peer.
///
/// A single call per attempt, no retries: at-most-once from this host. The
/// caller's deadline bounds both connection establishment and the RPC itself
/// via the grpc-timeout header.
pub struct GrpcAttemptForwarder {
    /// Channels keyed by peer host key. tonic channels multiplex, so one per
    /// peer is enough; a channel that failed is evicted and redialed.
    channels: DashMap<String, Channel>,
    /// Deadline applied when the attempt carries none
    default_deadline: Duration,
}

impl GrpcAttemptForwarder {
    pub fn new(default_deadline: Duration) -> Self {
        Self {
            channels: DashMap::new(),
            default_deadline,
        }
    }

    async fn channel_for(&self, owner: &RemoteHost, deadline: Duration) -> Result<Channel> {
        if let Some(channel) = self.channels.get(&owner.key) {
            return Ok(channel.clone());
        }

        let endpoint = Endpoint::from_shared(owner.endpoint())
            .map_err(|e| GuardpostError::Unreachable {
                host: owner.key.clone(),
                reason: format!("invalid endpoint: {e}"),
            })?
            .connect_timeout(deadline);

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| GuardpostError::Unreachable {
                host: owner.key.clone(),
                reason: e.to_string(),
            })?;

        self.channels.insert(owner.key.clone(), channel.clone());
        debug!(peer = %owner.key, addr = %owner.addr, "Connected to owning host");
        Ok(channel)
    }
}

#[async_trait]
impl AttemptForwarder for GrpcAttemptForwarder {
    async fn forward(
        &self,
        owner: &RemoteHost,
        request: AttemptRequest,
    ) -> Result<AttemptOutcome> {
        let deadline = request.deadline.unwrap_or(self.default_deadline);
        let channel = self.channel_for(owner, deadline).await?;
        let mut client = LoginBlockingClient::new(channel);

        let mut rpc = Request::new(CheckAttemptRequest {
            account_id: request.account_id,
            submitted_credential: request.submitted_credential,
            deadline: Some(prost_types::Duration {
                seconds: deadline.as_secs() as i64,
                nanos: deadline.subsec_nanos() as i32,
            }),
        });
        rpc.set_timeout(deadline);

        let response = match client.check_attempt(rpc).await {
            Ok(response) => response,
            Err(status) => {
                return Err(match status.code() {
                    Code::DeadlineExceeded | Code::Cancelled => GuardpostError::Timeout(deadline),
                    Code::Unavailable => {
                        // The channel may be dead; redial on the next attempt.
                        self.channels.remove(&owner.key);
                        warn!(peer = %owner.key, "Owning host unavailable");
                        GuardpostError::Unreachable {
                            host: owner.key.clone(),
                            reason: status.message().to_string(),
                        }
                    }
                    _ => GuardpostError::Status(status),
                });
            }
        };

        AttemptOutcome::from_proto(response.get_ref().outcome).ok_or_else(|| {
            GuardpostError::Unreachable {
                host: owner.key.clone(),
                reason: "remote returned an unspecified outcome".to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(key: &str, addr: &str) -> RemoteHost {
        RemoteHost::new(key, addr.parse().unwrap(), 1.0)
    }

    #[tokio::test]
    async fn test_unreachable_peer_surfaces_as_unreachable() {
        let forwarder = GrpcAttemptForwarder::new(Duration::from_millis(200));
        // Nothing listens here.
        let owner = host("peer", "127.0.0.1:59999");

        let result = forwarder
            .forward(
                &owner,
                AttemptRequest {
                    account_id: "alice".to_string(),
                    submitted_credential: "pw".to_string(),
                    deadline: Some(Duration::from_millis(200)),
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(GuardpostError::Unreachable { host, .. }) if host == "peer"
        ));
    }

    #[test]
    fn test_no_channel_cached_until_first_use() {
        let forwarder = GrpcAttemptForwarder::new(Duration::from_secs(1));
        assert!(forwarder.channels.is_empty());
    }
}
