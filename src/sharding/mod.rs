//! Responsibility assignment across the fleet.
//!
//! This module decides which host is authoritative for a given account key
//! using weighted rendezvous hashing: deterministic, coordination-free, and
//! minimally disruptive when membership changes.

mod host;
mod responsibility;

pub use host::{RemoteHost, ShardMember};
pub use responsibility::ResponsibilitySet;
