//! Weighted rendezvous hashing over fleet members.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use super::host::ShardMember;

/// Maps lookup keys to the member authoritative for them.
///
/// Every member scores each lookup key independently
/// (`-weight / ln(hash_to_unit_interval(member, key))`, the weighted
/// rendezvous formula) and the highest score wins. Removing a member only
/// reassigns the keys that member was winning; adding one only claims the
/// keys it now wins. Lookups take a read lock only; membership changes are
/// rare, administrative, and last-writer-wins.
pub struct ResponsibilitySet<H: ShardMember + Clone> {
    members: RwLock<HashMap<String, H>>,
}

impl<H: ShardMember + Clone> ResponsibilitySet<H> {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Add (or replace) a member under the given key.
    pub fn add(&self, key: &str, member: H) {
        debug!(member = key, "Adding responsibility set member");
        self.members.write().insert(key.to_string(), member);
    }

    /// Remove the member under the given key, if present.
    pub fn remove(&self, key: &str) {
        debug!(member = key, "Removing responsibility set member");
        self.members.write().remove(key);
    }

    /// Number of members currently in the set.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Find the member authoritative for `lookup_key`.
    ///
    /// Pure in current membership and the key: identical membership always
    /// yields the same owner, across calls and across process restarts.
    /// Returns `None` only when the set is empty.
    pub fn find_owner(&self, lookup_key: &str) -> Option<H> {
        let members = self.members.read();
        members
            .values()
            .map(|m| (score(m, lookup_key), m))
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, m)| m.clone())
    }
}

impl<H: ShardMember + Clone> Default for ResponsibilitySet<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted rendezvous score for one member and one lookup key.
fn score<H: ShardMember>(member: &H, lookup_key: &str) -> f64 {
    let u = hash_to_unit_interval(member.identity(), lookup_key);
    -member.weight() / u.ln()
}

/// Digest `(identity, key)` into the open interval (0, 1).
///
/// SHA-256 rather than the std hasher: SipHash keys are randomized per
/// process, which would reshuffle ownership on every restart.
fn hash_to_unit_interval(identity: &str, lookup_key: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update([0u8]);
    hasher.update(lookup_key.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(bytes);

    // Map to (0, 1): never exactly 0 (ln would be -inf with the wrong sign)
    // and never exactly 1 (ln of 1 is 0, dividing by it is undefined).
    (n as f64 + 1.0) / (u64::MAX as f64 + 2.0)
}
