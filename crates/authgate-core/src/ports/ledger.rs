//! Attempt ledger port - the append-only store behind every rate decision.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AttemptKey, AttemptOutcome, RecordId};

/// Failures counted inside a window, with the oldest one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureStats {
    pub count: u64,
    pub oldest: Option<DateTime<Utc>>,
}

/// Attempt ledger trait - abstraction over the shared counter store
/// (PostgreSQL, Redis, in-memory).
///
/// Windows are half-open: a record belongs to the window starting at
/// `window_start` when its timestamp is strictly later than `window_start`.
#[async_trait]
pub trait AttemptLedger: Send + Sync {
    /// Append one immutable record. Atomic per record.
    async fn append(
        &self,
        key: &AttemptKey,
        outcome: AttemptOutcome,
        at: DateTime<Utc>,
    ) -> Result<RecordId, LedgerError>;

    /// Count failures for `key` inside the window, plus the oldest of them.
    async fn failure_stats(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<FailureStats, LedgerError>;

    /// Count failures for `key` inside the window.
    async fn count_failures_in_window(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        Ok(self.failure_stats(key, window_start).await?.count)
    }

    /// Remove every failure record for `key`, keeping successes for audit.
    /// Clearing a key without failures is a no-op.
    async fn clear(&self, key: &AttemptKey) -> Result<(), LedgerError>;

    /// Compaction: drop records older than `cutoff`, returning how many went.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Ledger store errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger query failed: {0}")]
    Query(String),
}
