//! Gateway-level error types.

use thiserror::Error;

/// Every way an authentication attempt can end without a verified identity.
///
/// `VerifierRejected` always appends one failure record; the other variants
/// leave the ledger untouched.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: retry after {retry_after_seconds}s ({attempts_count} failed attempts)")]
    RateLimited {
        retry_after_seconds: u64,
        attempts_count: u64,
    },

    #[error("Credentials rejected: {message}")]
    VerifierRejected {
        message: String,
        attempts_remaining: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Window policy configuration errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Window must be positive, got {0} minutes")]
    NonPositiveWindow(i64),

    #[error("Window must not exceed one year, got {0} minutes")]
    WindowTooLong(i64),

    #[error("Max attempts must be at least 1")]
    ZeroMaxAttempts,
}
