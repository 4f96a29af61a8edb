//! Rate limiting port.

use async_trait::async_trait;

use crate::domain::{AttemptKey, WindowPolicy, WindowState};

use super::LedgerError;

/// Rate limiter trait - admission decisions for attempt keys.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Derive the current window state for `key`. Never records anything.
    async fn check(&self, key: &AttemptKey) -> Result<WindowState, RateLimitError>;

    /// Thresholds this limiter enforces.
    fn policy(&self) -> WindowPolicy;
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<LedgerError> for RateLimitError {
    fn from(err: LedgerError) -> Self {
        RateLimitError::Backend(err.to_string())
    }
}
