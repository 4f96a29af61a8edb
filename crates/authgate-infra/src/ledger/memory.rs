//! In-memory attempt ledger - used when no shared store is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use authgate_core::domain::{AttemptKey, AttemptOutcome, AttemptRecord, RecordId};
use authgate_core::ports::{AttemptLedger, FailureStats, LedgerError};

/// In-memory ledger keyed by attempt key, with an async RwLock.
///
/// Note: Limits are per-process, not shared across instances, and the
/// history is lost on restart.
pub struct InMemoryAttemptLedger {
    store: RwLock<HashMap<AttemptKey, Vec<AttemptRecord>>>,
}

impl InMemoryAttemptLedger {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of records held, across all keys.
    pub async fn len(&self) -> usize {
        self.store.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Full history for one key, oldest first.
    #[cfg(test)]
    pub async fn history(&self, key: &AttemptKey) -> Vec<AttemptRecord> {
        self.store
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryAttemptLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttemptLedger for InMemoryAttemptLedger {
    async fn append(
        &self,
        key: &AttemptKey,
        outcome: AttemptOutcome,
        at: DateTime<Utc>,
    ) -> Result<RecordId, LedgerError> {
        let record = AttemptRecord::new(key.clone(), outcome, at);
        let id = record.id;

        let mut store = self.store.write().await;
        store.entry(key.clone()).or_default().push(record);

        Ok(id)
    }

    async fn failure_stats(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<FailureStats, LedgerError> {
        let store = self.store.read().await;
        let Some(records) = store.get(key) else {
            return Ok(FailureStats::default());
        };

        let stats = records
            .iter()
            .filter(|r| r.outcome.is_failure() && r.attempted_at > window_start)
            .fold(FailureStats::default(), |acc, r| FailureStats {
                count: acc.count + 1,
                oldest: Some(acc.oldest.map_or(r.attempted_at, |o| o.min(r.attempted_at))),
            });

        Ok(stats)
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), LedgerError> {
        let mut store = self.store.write().await;
        if let Some(records) = store.get_mut(key) {
            records.retain(|r| !r.outcome.is_failure());
            if records.is_empty() {
                store.remove(key);
            }
        }
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut store = self.store.write().await;
        let mut purged = 0u64;

        store.retain(|_, records| {
            let before = records.len();
            records.retain(|r| r.attempted_at >= cutoff);
            purged += (before - records.len()) as u64;
            !records.is_empty()
        });

        Ok(purged)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
