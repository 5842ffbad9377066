//! Guardpost - Distributed Login-Attempt Blocking Service
//!
//! This crate implements a service that defends authentication against
//! credential-guessing attacks. Each host in a fleet is authoritative for a
//! shard of accounts (weighted rendezvous hashing); attempts against accounts
//! a host does not own are forwarded to the owner over gRPC. Decisions
//! combine failed-password popularity over multiple sliding windows with
//! per-account attempt budgets over multiple trailing time periods.

pub mod blocking;
pub mod config;
pub mod credential;
pub mod credit;
pub mod error;
pub mod grpc;
pub mod sharding;
pub mod store;
pub mod tracking;
