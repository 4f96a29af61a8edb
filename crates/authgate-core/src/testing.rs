//! Test doubles shared by the unit tests in this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AttemptKey, AttemptOutcome, AttemptRecord, AuthUser, RecordId, Session, VerifiedIdentity,
};
use crate::ports::{AttemptLedger, CredentialVerifier, FailureStats, LedgerError, VerifierError};

/// Vec-backed ledger that counts how often it is queried.
#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<AttemptRecord>>,
    stats_calls: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn count_outcome(&self, outcome: AttemptOutcome) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.outcome == outcome)
            .count()
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Appends plus clears.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn ensure_up(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("test store down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AttemptLedger for MemoryLedger {
    async fn append(
        &self,
        key: &AttemptKey,
        outcome: AttemptOutcome,
        at: DateTime<Utc>,
    ) -> Result<RecordId, LedgerError> {
        self.ensure_up()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let record = AttemptRecord::new(key.clone(), outcome, at);
        let id = record.id;
        self.records.lock().unwrap().push(record);
        Ok(id)
    }

    async fn failure_stats(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<FailureStats, LedgerError> {
        self.ensure_up()?;
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        let in_window = records
            .iter()
            .filter(|r| &r.key == key && r.outcome.is_failure() && r.attempted_at > window_start);

        let mut stats = FailureStats::default();
        for record in in_window {
            stats.count += 1;
            stats.oldest = Some(match stats.oldest {
                Some(oldest) => oldest.min(record.attempted_at),
                None => record.attempted_at,
            });
        }
        Ok(stats)
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), LedgerError> {
        self.ensure_up()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .retain(|r| &r.key != key || !r.outcome.is_failure());
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.attempted_at >= cutoff);
        Ok((before - records.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "test"
    }
}

/// How the stub verifier answers anything other than the accepted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    Normal,
    TransportDown,
    Hang,
}

/// Verifier that accepts exactly one email/password pair.
pub struct StubVerifier {
    email: String,
    password: String,
    mode: Mutex<StubMode>,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub fn accepting(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            mode: Mutex::new(StubMode::Normal),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: StubMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, email: &str, password: &str) -> Result<VerifiedIdentity, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            StubMode::TransportDown => {
                return Err(VerifierError::Transport("connection refused".to_string()));
            }
            StubMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            StubMode::Normal => {}
        }

        if email == self.email && password == self.password {
            Ok(identity(email))
        } else {
            Err(VerifierError::Rejected("Invalid login credentials".to_string()))
        }
    }
}

pub fn identity(email: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        session: Some(Session {
            access_token: "token".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: None,
            refresh_token: None,
        }),
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some(email.to_string()),
            full_name: None,
            created_at: None,
        },
    }
}

#[async_trait]
impl CredentialVerifier for StubVerifier {
    async fn sign_in(&self, email: &str, password: &str) -> Result<VerifiedIdentity, VerifierError> {
        self.answer(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _full_name: Option<&str>,
    ) -> Result<VerifiedIdentity, VerifierError> {
        self.answer(email, password).await
    }
}
