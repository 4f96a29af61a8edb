//! Rate-limited authentication gateway.
//!
//! Each call to [`AuthGateway::handle`] walks one request through
//! `Received -> LimitChecked -> {Blocked | Verifying} -> {RecordedSuccess |
//! RecordedFailure} -> Responded`. Requests never wait on each other; all
//! shared state lives in the attempt ledger.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    AttemptKey, AttemptOutcome, AuthAction, VerifiedIdentity, WindowPolicy, mask_email,
};
use crate::error::GatewayError;
use crate::ports::{AttemptLedger, Clock, CredentialVerifier, RateLimiter, VerifierError};

use super::LedgerRateLimiter;

/// Address used when no client address could be determined.
pub const UNKNOWN_ADDRESS: &str = "unknown";

const MISSING_FIELDS: &str = "Missing required fields";
const INVALID_ACTION: &str = "Invalid action";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub policy: WindowPolicy,
    /// Budget for one verifier call. Expiry is an internal error, not a failure.
    pub verifier_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            policy: WindowPolicy::default(),
            verifier_timeout: Duration::from_secs(10),
        }
    }
}

/// Raw authentication request as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub ip_address: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub action: Option<String>,
    pub full_name: Option<String>,
}

/// Request lifecycle phases, used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    LimitChecked,
    Blocked,
    Verifying,
    RecordedSuccess,
    RecordedFailure,
    Responded,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Received => "received",
            Phase::LimitChecked => "limit_checked",
            Phase::Blocked => "blocked",
            Phase::Verifying => "verifying",
            Phase::RecordedSuccess => "recorded_success",
            Phase::RecordedFailure => "recorded_failure",
            Phase::Responded => "responded",
        }
    }
}

/// Validated request, ready for admission.
struct Admitted {
    key: AttemptKey,
    email: String,
    password: String,
    action: AuthAction,
    full_name: Option<String>,
}

/// The gateway - admission, verification and ledger bookkeeping.
pub struct AuthGateway {
    limiter: Arc<dyn RateLimiter>,
    ledger: Arc<dyn AttemptLedger>,
    verifier: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    verifier_timeout: Duration,
}

impl AuthGateway {
    /// Build a gateway whose limiter reads from the same ledger it writes to.
    pub fn new(
        ledger: Arc<dyn AttemptLedger>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
        config: GatewayConfig,
    ) -> Self {
        let limiter = Arc::new(LedgerRateLimiter::new(
            ledger.clone(),
            clock.clone(),
            config.policy,
        ));

        Self {
            limiter,
            ledger,
            verifier,
            clock,
            verifier_timeout: config.verifier_timeout,
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.limiter.policy()
    }

    pub fn ledger(&self) -> &Arc<dyn AttemptLedger> {
        &self.ledger
    }

    /// Run one authentication attempt through the gateway.
    pub async fn handle(&self, request: AuthRequest) -> Result<VerifiedIdentity, GatewayError> {
        let admitted = Self::validate(request)?;
        let key = &admitted.key;
        let masked = key.masked_email();
        tracing::debug!(
            phase = Phase::Received.as_str(),
            ip = %key.ip_address(),
            email = %masked,
            action = admitted.action.as_str(),
            "Auth request received"
        );

        let state = self.limiter.check(key).await.map_err(|e| {
            tracing::error!(ip = %key.ip_address(), error = %e, "Rate limit check failed");
            GatewayError::Internal(e.to_string())
        })?;
        tracing::debug!(
            phase = Phase::LimitChecked.as_str(),
            attempts = state.attempts_count,
            "Rate limit checked"
        );

        if state.is_blocked {
            tracing::warn!(
                phase = Phase::Blocked.as_str(),
                ip = %key.ip_address(),
                email = %masked,
                retry_after = state.retry_after_seconds,
                attempts = state.attempts_count,
                "Rate limited"
            );
            return Err(GatewayError::RateLimited {
                retry_after_seconds: state.retry_after_seconds,
                attempts_count: state.attempts_count,
            });
        }

        tracing::debug!(phase = Phase::Verifying.as_str(), "Forwarding to verifier");
        let verdict = tokio::time::timeout(self.verifier_timeout, self.verify(&admitted)).await;

        let result = match verdict {
            Ok(Ok(identity)) => {
                // Ledger faults here never undo an authenticated caller.
                if let Err(e) = self.ledger.clear(key).await {
                    tracing::warn!(ip = %key.ip_address(), email = %masked, error = %e, "Failed to clear attempts");
                }
                if let Err(e) = self
                    .ledger
                    .append(key, AttemptOutcome::Success, self.clock.now())
                    .await
                {
                    tracing::warn!(ip = %key.ip_address(), email = %masked, error = %e, "Failed to record successful attempt");
                }
                tracing::info!(
                    phase = Phase::RecordedSuccess.as_str(),
                    ip = %key.ip_address(),
                    email = %masked,
                    action = admitted.action.as_str(),
                    "Successful authentication"
                );
                Ok(identity)
            }
            Ok(Err(VerifierError::Rejected(message))) => {
                let attempts_remaining = self.record_failure(key, state.attempts_count).await;
                tracing::info!(
                    phase = Phase::RecordedFailure.as_str(),
                    ip = %key.ip_address(),
                    email = %masked,
                    action = admitted.action.as_str(),
                    attempts_remaining,
                    reason = %message,
                    "Failed authentication attempt"
                );
                Err(GatewayError::VerifierRejected {
                    message,
                    attempts_remaining,
                })
            }
            Ok(Err(VerifierError::Transport(detail))) => {
                tracing::error!(ip = %key.ip_address(), error = %detail, "Verifier unavailable");
                Err(GatewayError::Internal(detail))
            }
            Err(_) => {
                tracing::error!(
                    ip = %key.ip_address(),
                    timeout_secs = self.verifier_timeout.as_secs(),
                    "Verifier call timed out"
                );
                Err(GatewayError::Internal("verifier timed out".to_string()))
            }
        };

        tracing::debug!(phase = Phase::Responded.as_str(), ok = result.is_ok(), "Auth request done");
        result
    }

    fn validate(request: AuthRequest) -> Result<Admitted, GatewayError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let (Some(email), Some(password), Some(action)) = (
            present(request.email),
            request.password.filter(|p| !p.is_empty()),
            present(request.action),
        ) else {
            return Err(GatewayError::InvalidRequest(MISSING_FIELDS.to_string()));
        };

        let action = AuthAction::parse(action.trim())
            .ok_or_else(|| GatewayError::InvalidRequest(INVALID_ACTION.to_string()))?;

        let ip_address = match request.ip_address.trim() {
            "" => UNKNOWN_ADDRESS.to_string(),
            ip => ip.to_string(),
        };

        Ok(Admitted {
            key: AttemptKey::new(ip_address, &email),
            email,
            password,
            action,
            full_name: present(request.full_name),
        })
    }

    async fn verify(&self, admitted: &Admitted) -> Result<VerifiedIdentity, VerifierError> {
        match admitted.action {
            AuthAction::SignIn => self.verifier.sign_in(&admitted.email, &admitted.password).await,
            AuthAction::SignUp => {
                self.verifier
                    .sign_up(
                        &admitted.email,
                        &admitted.password,
                        admitted.full_name.as_deref(),
                    )
                    .await
            }
        }
    }

    /// Append the failure and report what is left of the budget.
    ///
    /// The count is re-read after the append rather than derived from the
    /// pre-verification state, so concurrent writers for the same key may
    /// shift it slightly.
    async fn record_failure(&self, key: &AttemptKey, prior_count: u64) -> u64 {
        let policy = self.limiter.policy();

        if let Err(e) = self
            .ledger
            .append(key, AttemptOutcome::Failure, self.clock.now())
            .await
        {
            tracing::error!(
                ip = %key.ip_address(),
                email = %mask_email(key.email()),
                error = %e,
                "Failed to record login attempt"
            );
        }

        match self.limiter.check(key).await {
            Ok(state) => policy.attempts_remaining(state.attempts_count),
            Err(e) => {
                tracing::warn!(error = %e, "Could not refresh attempt count");
                policy.attempts_remaining(prior_count + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualClock;
    use crate::testing::{MemoryLedger, StubMode, StubVerifier};
    use chrono::{TimeDelta, TimeZone, Utc};

    const IP_A: &str = "203.0.113.10";
    const GOOD_EMAIL: &str = "x@example.com";
    const GOOD_PASSWORD: &str = "correct horse";

    struct Harness {
        gateway: AuthGateway,
        ledger: Arc<MemoryLedger>,
        verifier: Arc<StubVerifier>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(MemoryLedger::default());
        let verifier = Arc::new(StubVerifier::accepting(GOOD_EMAIL, GOOD_PASSWORD));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let gateway = AuthGateway::new(
            ledger.clone(),
            verifier.clone(),
            clock.clone(),
            GatewayConfig {
                policy: WindowPolicy::new(15, 5),
                verifier_timeout: Duration::from_millis(100),
            },
        );
        Harness {
            gateway,
            ledger,
            verifier,
            clock,
        }
    }

    fn request(ip: &str, email: &str, password: &str, action: &str) -> AuthRequest {
        AuthRequest {
            ip_address: ip.to_string(),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            action: Some(action.to_string()),
            full_name: None,
        }
    }

    fn sign_in(email: &str, password: &str) -> AuthRequest {
        request(IP_A, email, password, "signin")
    }

    #[tokio::test]
    async fn test_missing_fields_never_touch_ledger() {
        let h = harness();

        for req in [
            AuthRequest {
                ip_address: IP_A.to_string(),
                ..Default::default()
            },
            AuthRequest {
                email: Some(GOOD_EMAIL.to_string()),
                password: Some(String::new()),
                action: Some("signin".to_string()),
                ..Default::default()
            },
            AuthRequest {
                email: Some("   ".to_string()),
                password: Some(GOOD_PASSWORD.to_string()),
                action: Some("signin".to_string()),
                ..Default::default()
            },
        ] {
            let err = h.gateway.handle(req).await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidRequest(ref m) if m == MISSING_FIELDS));
        }

        assert_eq!(h.ledger.stats_calls(), 0);
        assert_eq!(h.ledger.writes(), 0);
        assert_eq!(h.verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_action_is_invalid() {
        let h = harness();
        let err = h
            .gateway
            .handle(request(IP_A, GOOD_EMAIL, GOOD_PASSWORD, "reset"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(ref m) if m == INVALID_ACTION));
        assert_eq!(h.ledger.stats_calls(), 0);
    }

    #[tokio::test]
    async fn test_failures_report_remaining_attempts() {
        let h = harness();

        for expected_remaining in (0..5).rev() {
            let err = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await.unwrap_err();
            match err {
                GatewayError::VerifierRejected {
                    message,
                    attempts_remaining,
                } => {
                    assert_eq!(message, "Invalid login credentials");
                    assert_eq!(attempts_remaining, expected_remaining);
                }
                other => panic!("unexpected error: {other:?}"),
            }
            h.clock.advance(TimeDelta::seconds(10));
        }
        assert_eq!(h.ledger.len(), 5);
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_rate_limited_without_side_effects() {
        let h = harness();
        for _ in 0..5 {
            let _ = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await;
            h.clock.advance(TimeDelta::seconds(12));
        }
        let calls_before = h.verifier.calls();
        let ledger_before = h.ledger.len();

        // Even the correct password is refused while blocked.
        let err = h
            .gateway
            .handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD))
            .await
            .unwrap_err();

        match err {
            GatewayError::RateLimited {
                retry_after_seconds,
                attempts_count,
            } => {
                assert_eq!(attempts_count, 5);
                assert_eq!(retry_after_seconds, 15 * 60 - 60);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.verifier.calls(), calls_before);
        assert_eq!(h.ledger.len(), ledger_before);
    }

    #[tokio::test]
    async fn test_failures_age_out_before_explicit_clear() {
        let h = harness();
        let start = h.clock.now();
        for _ in 0..5 {
            let _ = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await;
            h.clock.advance(TimeDelta::seconds(10));
        }

        h.clock.set(start + TimeDelta::minutes(20));
        let key = AttemptKey::new(IP_A, GOOD_EMAIL);
        let window_start = h.gateway.policy().window_start(h.clock.now());
        assert_eq!(
            h.ledger.count_failures_in_window(&key, window_start).await.unwrap(),
            0
        );

        let identity = h
            .gateway
            .handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD))
            .await
            .unwrap();
        assert_eq!(identity.user.email.as_deref(), Some(GOOD_EMAIL));
        assert_eq!(h.ledger.count_outcome(AttemptOutcome::Failure), 0);
        assert_eq!(h.ledger.count_outcome(AttemptOutcome::Success), 1);
    }

    #[tokio::test]
    async fn test_success_is_recorded_for_audit() {
        let h = harness();
        h.gateway
            .handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD))
            .await
            .unwrap();

        assert_eq!(h.ledger.len(), 1);
        assert_eq!(h.ledger.count_outcome(AttemptOutcome::Success), 1);
        let key = AttemptKey::new(IP_A, GOOD_EMAIL);
        let window_start = h.gateway.policy().window_start(h.clock.now());
        assert_eq!(
            h.ledger.count_failures_in_window(&key, window_start).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_verifier_receives_email_as_submitted() {
        let h = harness();
        let err = h
            .gateway
            .handle(sign_in(" X@Example.com ", GOOD_PASSWORD))
            .await
            .unwrap_err();

        // The stub only accepts the exact stored address; the key is still normalized.
        assert!(matches!(err, GatewayError::VerifierRejected { .. }));
        let window_start = h.gateway.policy().window_start(h.clock.now());
        assert_eq!(
            h.ledger
                .count_failures_in_window(&AttemptKey::new(IP_A, GOOD_EMAIL), window_start)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_keys_are_independent_per_email() {
        let h = harness();
        for _ in 0..5 {
            let _ = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await;
        }
        assert!(matches!(
            h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await,
            Err(GatewayError::RateLimited { .. })
        ));

        let err = h
            .gateway
            .handle(sign_in("y@example.com", "whatever"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::VerifierRejected {
                attempts_remaining: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_success_resets_count() {
        let h = harness();
        for _ in 0..4 {
            let _ = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await;
        }

        h.gateway
            .handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD))
            .await
            .unwrap();
        let state = h
            .gateway
            .limiter
            .check(&AttemptKey::new(IP_A, GOOD_EMAIL))
            .await
            .unwrap();
        assert!(!state.is_blocked);
        assert_eq!(state.attempts_count, 0);

        // Counting restarts from zero: the fifth post-success failure is still admitted.
        for expected_remaining in (0..5).rev() {
            let err = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await.unwrap_err();
            assert!(matches!(
                err,
                GatewayError::VerifierRejected { attempts_remaining, .. } if attempts_remaining == expected_remaining
            ));
        }
        assert!(matches!(
            h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await,
            Err(GatewayError::RateLimited { attempts_count: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_email_case_shares_bucket() {
        let h = harness();
        for email in ["X@example.com", "x@EXAMPLE.com", " x@example.com", "x@example.COM", "X@Example.Com"] {
            let _ = h.gateway.handle(sign_in(email, "wrong")).await;
        }
        assert!(matches!(
            h.gateway.handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD)).await,
            Err(GatewayError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_recorded() {
        let h = harness();
        h.verifier.set_mode(StubMode::TransportDown);

        let err = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(h.ledger.len(), 0);
    }

    #[tokio::test]
    async fn test_verifier_timeout_is_not_recorded() {
        let h = harness();
        h.verifier.set_mode(StubMode::Hang);

        let err = h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(h.ledger.len(), 0);
    }

    #[tokio::test]
    async fn test_store_outage_before_verification_is_internal() {
        let h = harness();
        h.ledger.set_unavailable(true);

        let err = h
            .gateway
            .handle(sign_in(GOOD_EMAIL, GOOD_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(h.verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_address_falls_back_to_unknown() {
        let h = harness();
        let _ = h.gateway.handle(request("  ", GOOD_EMAIL, "wrong", "signin")).await;

        let key = AttemptKey::new(UNKNOWN_ADDRESS, GOOD_EMAIL);
        let window_start = h.gateway.policy().window_start(h.clock.now());
        assert_eq!(
            h.ledger.count_failures_in_window(&key, window_start).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_all_recorded() {
        let h = Arc::new(harness());

        let attempts = (0..3).map(|_| {
            let h = h.clone();
            async move { h.gateway.handle(sign_in(GOOD_EMAIL, "wrong")).await }
        });
        let results = futures::future::join_all(attempts).await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(GatewayError::VerifierRejected { .. }))));
        assert_eq!(h.ledger.len(), 3);
    }

    #[tokio::test]
    async fn test_signup_failures_share_the_budget() {
        let h = harness();
        let err = h
            .gateway
            .handle(request(IP_A, GOOD_EMAIL, "short", "signup"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::VerifierRejected {
                attempts_remaining: 4,
                ..
            }
        ));
    }
}
