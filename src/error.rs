//! Error types for the Guardpost service.

use thiserror::Error;

/// Main error type for Guardpost operations.
///
/// Credit denial is deliberately not represented here: running out of budget
/// is an expected outcome of a consumption check, carried as a value
/// (`credit::ConsumeOutcome::Denied`), not an error.
#[derive(Error, Debug)]
pub enum GuardpostError {
    /// An operation did not complete within its deadline. The result is
    /// indeterminate, never an implicit allow or block.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Forwarding an attempt to the owning host failed.
    #[error("Owning host {host} unreachable: {reason}")]
    Unreachable { host: String, reason: String },

    /// The memory guard refused to admit new work.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A tracker invariant was violated. Fatal to that tracker instance.
    #[error("Corrupt tracker state: {0}")]
    CorruptState(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable store errors
    #[error("Store error: {0}")]
    Store(String),

    /// gRPC transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// gRPC status returned by a remote host
    #[error("Remote status: {0}")]
    Status(#[from] tonic::Status),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Guardpost operations.
pub type Result<T> = std::result::Result<T, GuardpostError>;
