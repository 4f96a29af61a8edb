//! PostgreSQL attempt ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DbConn, DbErr, EntityTrait, FromQueryResult, QueryFilter, QuerySelect};

use authgate_core::domain::{AttemptKey, AttemptOutcome, AttemptRecord, RecordId};
use authgate_core::ports::{AttemptLedger, FailureStats, LedgerError};

use crate::database::entity::login_attempt::{self, Entity as LoginAttempt};

/// Aggregate row for one key's window.
#[derive(Debug, FromQueryResult)]
struct WindowAggregate {
    count: i64,
    oldest: Option<DateTimeWithTimeZone>,
}

/// Ledger backed by the `login_attempts` table.
///
/// Every gateway instance pointed at the same database shares one ledger.
pub struct PostgresAttemptLedger {
    db: DbConn,
}

impl PostgresAttemptLedger {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn map_db_err(err: DbErr) -> LedgerError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => LedgerError::Unavailable(err.to_string()),
        other => LedgerError::Query(other.to_string()),
    }
}

#[async_trait]
impl AttemptLedger for PostgresAttemptLedger {
    async fn append(
        &self,
        key: &AttemptKey,
        outcome: AttemptOutcome,
        at: DateTime<Utc>,
    ) -> Result<RecordId, LedgerError> {
        let record = AttemptRecord::new(key.clone(), outcome, at);
        let id = record.id;
        let active: login_attempt::ActiveModel = record.into();

        LoginAttempt::insert(active)
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(id)
    }

    async fn failure_stats(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<FailureStats, LedgerError> {
        let window_start: DateTimeWithTimeZone = window_start.into();

        let aggregate = LoginAttempt::find()
            .select_only()
            .column_as(Expr::col(login_attempt::Column::Id).count(), "count")
            .column_as(Expr::col(login_attempt::Column::AttemptedAt).min(), "oldest")
            .filter(login_attempt::Column::IpAddress.eq(key.ip_address()))
            .filter(login_attempt::Column::Email.eq(key.email()))
            .filter(login_attempt::Column::Success.eq(false))
            .filter(login_attempt::Column::AttemptedAt.gt(window_start))
            .into_model::<WindowAggregate>()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(aggregate
            .map(|row| FailureStats {
                count: row.count.max(0) as u64,
                oldest: row.oldest.map(Into::into),
            })
            .unwrap_or_default())
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), LedgerError> {
        let result = LoginAttempt::delete_many()
            .filter(login_attempt::Column::IpAddress.eq(key.ip_address()))
            .filter(login_attempt::Column::Email.eq(key.email()))
            .filter(login_attempt::Column::Success.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(
            ip = %key.ip_address(),
            email = %key.masked_email(),
            removed = result.rows_affected,
            "Cleared login attempts"
        );
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let cutoff: DateTimeWithTimeZone = cutoff.into();

        let result = LoginAttempt::delete_many()
            .filter(login_attempt::Column::AttemptedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
