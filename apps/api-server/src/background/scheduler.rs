//! Maintenance jobs on cron schedules: ledger compaction and throttle pruning.

use std::sync::Arc;

use chrono::TimeDelta;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use authgate_core::ports::{AttemptLedger, Clock};
use authgate_infra::RequestThrottle;

use super::compaction::run_compaction;

/// Throttle state is swept once a minute, off the top of the minute.
pub const THROTTLE_PRUNE_CRON: &str = "30 * * * * *";

/// `SCHEDULER_ENABLED=false` (or `0`) turns maintenance off. Default on.
pub fn enabled_from_env() -> bool {
    std::env::var("SCHEDULER_ENABLED")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true)
}

/// Owns the gateway's periodic housekeeping. Schedules use six fields,
/// seconds first.
pub struct MaintenanceScheduler {
    inner: JobScheduler,
    jobs: Vec<(&'static str, Uuid)>,
}

impl MaintenanceScheduler {
    pub async fn new() -> Result<Self, JobSchedulerError> {
        Ok(Self {
            inner: JobScheduler::new().await?,
            jobs: Vec::new(),
        })
    }

    /// Purge ledger records older than `retention` on `schedule`.
    pub async fn register_compaction(
        &mut self,
        schedule: &str,
        ledger: Arc<dyn AttemptLedger>,
        clock: Arc<dyn Clock>,
        retention: TimeDelta,
    ) -> Result<Uuid, JobSchedulerError> {
        let job = Job::new_async(schedule, move |_id, _lock| {
            Box::pin(run_compaction(ledger.clone(), clock.clone(), retention))
        })?;

        self.register("ledger_compaction", schedule, job).await
    }

    /// Forget idle addresses in the request throttle on `schedule`.
    pub async fn register_throttle_prune(
        &mut self,
        schedule: &str,
        throttle: Arc<RequestThrottle>,
    ) -> Result<Uuid, JobSchedulerError> {
        let job = Job::new_async(schedule, move |_id, _lock| {
            let throttle = throttle.clone();
            Box::pin(async move {
                let tracked = throttle.prune();
                tracing::debug!(tracked, "Request throttle pruned");
            })
        })?;

        self.register("throttle_prune", schedule, job).await
    }

    async fn register(
        &mut self,
        name: &'static str,
        schedule: &str,
        job: Job,
    ) -> Result<Uuid, JobSchedulerError> {
        let id = self.inner.add(job).await?;
        self.jobs.push((name, id));
        tracing::info!(job = name, schedule = %schedule, job_id = %id, "Maintenance job registered");
        Ok(id)
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        self.inner.start().await?;
        tracing::info!(
            jobs = ?self.jobs.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            "Maintenance scheduler started"
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Maintenance scheduler stopped");
        Ok(())
    }
}
