//! Account and attempt records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocking::AttemptOutcome;

/// A stored credential: scheme name, work factor, salt, and the derived hash.
///
/// The scheme name and iteration count travel with the account so the
/// verifier can re-derive old hashes after the deployment default changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialHash {
    pub scheme: String,
    pub iterations: u32,
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
}

/// Hex-encode byte fields so serialized accounts stay greppable.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Opaque account identifier
    pub id: String,
    /// Stored credential hash
    pub credential: CredentialHash,
    /// Monotonic count of attempts evaluated against this account
    pub attempt_sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(id: impl Into<String>, credential: CredentialHash) -> Self {
        Self {
            id: id.into(),
            credential,
            attempt_sequence: 0,
            created_at: Utc::now(),
        }
    }
}

/// One evaluated login attempt. Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: Uuid,
    pub account_id: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    /// Whether the submitted credential matched the stored one
    pub credential_matched: bool,
    /// The account's attempt sequence number at evaluation time
    pub sequence: u64,
}

impl LoginAttempt {
    pub fn record(
        account_id: impl Into<String>,
        outcome: AttemptOutcome,
        sequence: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            timestamp: Utc::now(),
            outcome,
            credential_matched: outcome.credentials_valid(),
            sequence,
        }
    }
}
