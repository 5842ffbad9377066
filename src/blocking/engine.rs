//! The login-attempt decision engine.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

use super::memory::MemoryGuard;
use super::outcome::AttemptOutcome;
use super::policy::BlockingPolicy;
use crate::credential::CredentialVerifier;
use crate::credit::CreditLimiter;
use crate::error::Result;
use crate::sharding::{RemoteHost, ResponsibilitySet, ShardMember};
use crate::store::{LoginAttempt, StableStore};
use crate::tracking::MultiperiodFrequencyTracker;

/// One incoming login attempt.
#[derive(Debug, Clone)]
pub struct AttemptRequest {
    pub account_id: String,
    pub submitted_credential: String,
    /// Remaining time budget. `None` applies no local deadline; callers at
    /// the RPC boundary always set one.
    pub deadline: Option<Duration>,
}

/// Anything that can classify an attempt. Implemented by the engine locally
/// and consumed by the gRPC service, so tests can drive the service with a
/// canned classifier.
#[async_trait]
pub trait AttemptClassifier: Send + Sync {
    async fn classify(&self, request: AttemptRequest) -> Result<AttemptOutcome>;
}

/// Carries an attempt to the host that owns its account.
///
/// One call, no retries: at-most-once from this host's perspective. Errors
/// come back as `Unreachable` or `Timeout`, never as a classification.
#[async_trait]
pub trait AttemptForwarder: Send + Sync {
    async fn forward(&self, owner: &RemoteHost, request: AttemptRequest)
        -> Result<AttemptOutcome>;
}

/// Renders allow/block classifications by combining ownership routing,
/// credential verification, failed-password popularity, and per-account
/// credit.
pub struct BlockingDecisionEngine {
    local_host: RemoteHost,
    responsibility: Arc<ResponsibilitySet<RemoteHost>>,
    popularity: Arc<MultiperiodFrequencyTracker<String>>,
    credit: Arc<CreditLimiter>,
    store: Arc<dyn StableStore>,
    verifier: Arc<dyn CredentialVerifier>,
    policy: Arc<dyn BlockingPolicy>,
    memory_guard: Arc<dyn MemoryGuard>,
    forwarder: Arc<dyn AttemptForwarder>,
}

impl BlockingDecisionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local_host: RemoteHost,
        responsibility: Arc<ResponsibilitySet<RemoteHost>>,
        popularity: Arc<MultiperiodFrequencyTracker<String>>,
        credit: Arc<CreditLimiter>,
        store: Arc<dyn StableStore>,
        verifier: Arc<dyn CredentialVerifier>,
        policy: Arc<dyn BlockingPolicy>,
        memory_guard: Arc<dyn MemoryGuard>,
        forwarder: Arc<dyn AttemptForwarder>,
    ) -> Self {
        Self {
            local_host,
            responsibility,
            popularity,
            credit,
            store,
            verifier,
            policy,
            memory_guard,
            forwarder,
        }
    }

    /// Classify one attempt: route, admit, verify, gather signals, decide,
    /// record.
    #[instrument(skip(self, request), fields(account = %request.account_id))]
    pub async fn handle_attempt(&self, request: AttemptRequest) -> Result<AttemptOutcome> {
        // Route. Attempts we do not own are answered by the owning host and
        // leave no local state behind.
        if let Some(owner) = self.responsibility.find_owner(&request.account_id) {
            if owner.identity() != self.local_host.identity() {
                trace!(owner = %owner.key, "Forwarding attempt to owning host");
                return self.forwarder.forward(&owner, request).await;
            }
        }

        // Admission before any per-account allocation.
        self.memory_guard.admit()?;

        let account = self.store.get_account(&request.account_id).await?;
        let credentials_valid = account
            .as_ref()
            .map(|a| {
                self.verifier
                    .verify(&a.credential, &request.submitted_credential)
            })
            .unwrap_or(false);

        // The trackers never see the cleartext credential.
        let password_key = digest_key(&request.submitted_credential);

        // The two signals are independent; issue them together, both bounded
        // by the caller's deadline.
        let (popularity, credit_outcome) = futures::join!(
            self.popularity.get_frequencies(&password_key, request.deadline),
            async { self.credit.try_consume(&request.account_id, 1) },
        );
        let popularity = popularity?;

        // Credit denial blocks unconditionally; the policy can only add
        // blocks, never lift that one.
        let blocked = credit_outcome.is_denied() || self.policy.should_block(&popularity);
        let outcome = AttemptOutcome::from_parts(credentials_valid, blocked);

        debug!(
            ?outcome,
            credit_denied = credit_outcome.is_denied(),
            "Classified login attempt"
        );

        // Popularity tracks guessed passwords: only failures feed it.
        if !credentials_valid {
            self.popularity
                .record_observation(password_key, request.deadline)
                .await?;
        }

        let sequence = match account {
            Some(mut account) => {
                account.attempt_sequence += 1;
                let sequence = account.attempt_sequence;
                self.store.put_account(account).await?;
                sequence
            }
            // Attempts against unknown accounts are still recorded so
            // stuffing runs against nonexistent users stay visible.
            None => 0,
        };

        self.store
            .append_attempt(LoginAttempt::record(
                request.account_id.as_str(),
                outcome,
                sequence,
            ))
            .await?;

        Ok(outcome)
    }
}

#[async_trait]
impl AttemptClassifier for BlockingDecisionEngine {
    async fn classify(&self, request: AttemptRequest) -> Result<AttemptOutcome> {
        self.handle_attempt(request).await
    }
}

/// Hex SHA-256 of the submitted credential, the only form trackers retain.
fn digest_key(credential: &str) -> String {
    hex::encode(Sha256::digest(credential.as_bytes()))
}
