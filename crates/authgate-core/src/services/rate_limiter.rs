//! Ledger-backed rate limiter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AttemptKey, WindowPolicy, WindowState};
use crate::ports::{AttemptLedger, Clock, RateLimitError, RateLimiter};

use super::window_counter;

/// Binds a window policy and a clock to the window counter.
pub struct LedgerRateLimiter {
    ledger: Arc<dyn AttemptLedger>,
    clock: Arc<dyn Clock>,
    policy: WindowPolicy,
}

impl LedgerRateLimiter {
    pub fn new(ledger: Arc<dyn AttemptLedger>, clock: Arc<dyn Clock>, policy: WindowPolicy) -> Self {
        Self {
            ledger,
            clock,
            policy,
        }
    }
}

#[async_trait]
impl RateLimiter for LedgerRateLimiter {
    async fn check(&self, key: &AttemptKey) -> Result<WindowState, RateLimitError> {
        let state =
            window_counter::evaluate(self.ledger.as_ref(), key, self.clock.now(), &self.policy)
                .await?;
        Ok(state)
    }

    fn policy(&self) -> WindowPolicy {
        self.policy
    }
}
