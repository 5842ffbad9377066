//! Durable account and attempt storage.
//!
//! The engine only needs read-your-writes consistency from a single host's
//! perspective; cross-host transactions are explicitly not required because
//! each account is owned by exactly one host at a time.

mod account;
mod backend;
mod memory;

pub use account::{CredentialHash, LoginAttempt, UserAccount};
pub use backend::StableStore;
pub use memory::MemoryStableStore;
