//! Trailing-window failure counting.
//!
//! The window state is recomputed from the ledger on every evaluation; no
//! running counter is kept anywhere, so there is nothing to drift out of
//! sync with the stored records.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{AttemptKey, WindowPolicy, WindowState};
use crate::ports::{AttemptLedger, FailureStats, LedgerError};

/// Evaluate the window ending at `now` for `key`.
///
/// A non-positive window disables limiting without touching the ledger.
pub async fn evaluate(
    ledger: &dyn AttemptLedger,
    key: &AttemptKey,
    now: DateTime<Utc>,
    policy: &WindowPolicy,
) -> Result<WindowState, LedgerError> {
    if policy.window <= TimeDelta::zero() {
        return Ok(WindowState::open());
    }

    let stats = ledger
        .failure_stats(key, policy.window_start(now))
        .await?;

    Ok(derive_state(stats, now, policy))
}

/// Turn raw failure stats into an admission state.
///
/// The retry delay is the time until the oldest counted failure leaves the
/// window, so a blocked key unblocks one failure at a time as the window
/// slides. It is rounded up to whole seconds and hits 0 at the instant the
/// oldest failure stops being counted.
pub fn derive_state(stats: FailureStats, now: DateTime<Utc>, policy: &WindowPolicy) -> WindowState {
    if policy.window <= TimeDelta::zero() {
        return WindowState::open();
    }

    let is_blocked = stats.count >= u64::from(policy.max_attempts);

    let retry_after_seconds = if !is_blocked {
        0
    } else {
        match stats.oldest {
            Some(oldest) => {
                let elapsed = (now - oldest).num_seconds().max(0);
                (policy.window_seconds() - elapsed).max(0) as u64
            }
            // Blocked with nothing to age out: only a zero threshold gets here.
            None => policy.window_seconds() as u64,
        }
    };

    WindowState {
        attempts_count: stats.count,
        oldest_attempt_in_window: stats.oldest,
        is_blocked,
        retry_after_seconds,
    }
}
