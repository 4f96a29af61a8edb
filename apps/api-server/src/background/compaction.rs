//! Ledger compaction: drops records too old to affect any window.

use std::sync::Arc;

use chrono::TimeDelta;

use authgate_core::ports::{AttemptLedger, Clock, LedgerError};

/// Purge every record older than `retention`. Returns the number removed.
pub async fn compact_ledger(
    ledger: &dyn AttemptLedger,
    clock: &dyn Clock,
    retention: TimeDelta,
) -> Result<u64, LedgerError> {
    let cutoff = clock.now() - retention;
    let purged = ledger.purge_before(cutoff).await?;

    tracing::info!(
        backend = ledger.backend_name(),
        cutoff = %cutoff,
        purged,
        "Ledger compaction finished"
    );
    Ok(purged)
}

/// Cron task body: compaction errors are logged, never propagated.
pub async fn run_compaction(
    ledger: Arc<dyn AttemptLedger>,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
) {
    if let Err(e) = compact_ledger(ledger.as_ref(), clock.as_ref(), retention).await {
        tracing::error!(error = %e, "Ledger compaction failed");
    }
}
