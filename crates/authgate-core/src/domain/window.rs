use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::PolicyError;

/// Longest window a policy may configure: one year.
pub const MAX_WINDOW_MINUTES: i64 = 365 * 24 * 60;

/// Thresholds for the trailing failure window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Length of the trailing window.
    pub window: TimeDelta,
    /// Failures tolerated inside the window before the key is blocked.
    pub max_attempts: u32,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            window: TimeDelta::minutes(15),
            max_attempts: 5,
        }
    }
}

impl WindowPolicy {
    /// Out-of-range minute counts saturate; `validate` rejects them.
    pub fn new(window_minutes: i64, max_attempts: u32) -> Self {
        let window = TimeDelta::try_minutes(window_minutes).unwrap_or(if window_minutes < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        });

        Self {
            window,
            max_attempts,
        }
    }

    /// Reject thresholds that would silently disable or permanently engage the limiter.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.window <= TimeDelta::zero() {
            return Err(PolicyError::NonPositiveWindow(self.window.num_minutes()));
        }
        if self.window > TimeDelta::minutes(MAX_WINDOW_MINUTES) {
            return Err(PolicyError::WindowTooLong(self.window.num_minutes()));
        }
        if self.max_attempts == 0 {
            return Err(PolicyError::ZeroMaxAttempts);
        }
        Ok(())
    }

    /// Exclusive lower bound of the window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn window_seconds(&self) -> i64 {
        self.window.num_seconds()
    }

    pub fn attempts_remaining(&self, attempts_count: u64) -> u64 {
        u64::from(self.max_attempts).saturating_sub(attempts_count)
    }
}

/// Admission state for one key, derived from the ledger on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowState {
    pub attempts_count: u64,
    pub oldest_attempt_in_window: Option<DateTime<Utc>>,
    pub is_blocked: bool,
    pub retry_after_seconds: u64,
}

impl WindowState {
    /// State of a key with no counted failures.
    pub fn open() -> Self {
        Self {
            attempts_count: 0,
            oldest_attempt_in_window: None,
            is_blocked: false,
            retry_after_seconds: 0,
        }
    }
}
