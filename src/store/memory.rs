//! In-memory reference store.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::account::{LoginAttempt, UserAccount};
use super::backend::StableStore;
use crate::error::Result;

/// DashMap-backed store. Trivially read-your-writes on a single host; useful
/// for tests, simulation, and single-node deployments.
#[derive(Default)]
pub struct MemoryStableStore {
    accounts: DashMap<String, UserAccount>,
    attempts: Mutex<Vec<LoginAttempt>>,
}

impl MemoryStableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Snapshot of the attempt history, oldest first.
    pub fn attempts(&self) -> Vec<LoginAttempt> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl StableStore for MemoryStableStore {
    async fn get_account(&self, id: &str) -> Result<Option<UserAccount>> {
        Ok(self.accounts.get(id).map(|a| a.value().clone()))
    }

    async fn put_account(&self, account: UserAccount) -> Result<()> {
        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn append_attempt(&self, attempt: LoginAttempt) -> Result<()> {
        self.attempts.lock().push(attempt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::AttemptOutcome;
    use crate::store::CredentialHash;

    fn account(id: &str) -> UserAccount {
        UserAccount::new(
            id,
            CredentialHash {
                scheme: "PBKDF2_SHA256".to_string(),
                iterations: 1,
                salt: vec![1],
                hash: vec![2],
            },
        )
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let store = MemoryStableStore::new();
        assert!(store.get_account("alice").await.unwrap().is_none());

        store.put_account(account("alice")).await.unwrap();
        let read = store.get_account("alice").await.unwrap().unwrap();
        assert_eq!(read.id, "alice");

        let mut updated = read;
        updated.attempt_sequence = 5;
        store.put_account(updated).await.unwrap();
        assert_eq!(
            store.get_account("alice").await.unwrap().unwrap().attempt_sequence,
            5
        );
    }

    #[tokio::test]
    async fn test_attempts_append_in_order() {
        let store = MemoryStableStore::new();
        for sequence in 1..=3 {
            store
                .append_attempt(LoginAttempt::record("alice", AttemptOutcome::Invalid, sequence))
                .await
                .unwrap();
        }

        let history = store.attempts();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|a| a.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
