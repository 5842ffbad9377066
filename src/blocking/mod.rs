//! The blocking decision engine and its policy seams.
//!
//! This is the orchestrator: it routes each attempt to the authoritative
//! host, combines credential verification with popularity and credit
//! signals, and renders one of the four terminal classifications.

mod engine;
mod memory;
mod outcome;
mod policy;

pub use engine::{AttemptClassifier, AttemptForwarder, AttemptRequest, BlockingDecisionEngine};
pub use memory::{LedgerCapGuard, MemoryGuard, UnboundedGuard};
pub use outcome::AttemptOutcome;
pub use policy::{BlockingPolicy, WeightedThresholdPolicy};
