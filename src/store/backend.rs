//! Storage trait for accounts and attempt history.

use async_trait::async_trait;

use super::account::{LoginAttempt, UserAccount};
use crate::error::Result;

/// Durable storage the decision engine runs against.
///
/// Implementations must provide read-your-writes consistency as seen from a
/// single host: a `put_account` followed by `get_account` on the same host
/// returns the written state.
#[async_trait]
pub trait StableStore: Send + Sync {
    /// Fetch an account by id. `Ok(None)` means no such account.
    async fn get_account(&self, id: &str) -> Result<Option<UserAccount>>;

    /// Create or replace an account.
    async fn put_account(&self, account: UserAccount) -> Result<()>;

    /// Append one attempt to the immutable history.
    async fn append_attempt(&self, attempt: LoginAttempt) -> Result<()>;
}
