//! Application state - shared across all handlers.

use std::sync::Arc;

use anyhow::Context;

use authgate_core::AuthGateway;
use authgate_core::ports::{
    AttemptLedger, CredentialVerifier, PasswordChangeNotifier, SystemClock,
};
use authgate_infra::{InMemoryAttemptLedger, LogNotifier};

use crate::config::{AppConfig, LedgerBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway>,
    pub notifier: Arc<dyn PasswordChangeNotifier>,
}

impl AppState {
    pub fn new(gateway: Arc<AuthGateway>, notifier: Arc<dyn PasswordChangeNotifier>) -> Self {
        Self { gateway, notifier }
    }

    /// Build the application state with the configured implementations.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let ledger = build_ledger(config.ledger_backend).await?;
        let verifier = build_verifier()?;
        let notifier = build_notifier()?;

        let gateway = AuthGateway::new(
            ledger,
            verifier,
            Arc::new(SystemClock),
            config.gateway.clone(),
        );

        tracing::info!(
            ledger = gateway.ledger().backend_name(),
            window_secs = gateway.policy().window_seconds(),
            max_attempts = gateway.policy().max_attempts,
            "Application state initialized"
        );

        Ok(Self::new(Arc::new(gateway), notifier))
    }
}

async fn build_ledger(backend: LedgerBackend) -> anyhow::Result<Arc<dyn AttemptLedger>> {
    match backend {
        LedgerBackend::Memory => {
            tracing::warn!(
                "Using in-memory attempt ledger. Limits are per-process and lost on restart."
            );
            Ok(Arc::new(InMemoryAttemptLedger::new()))
        }

        #[cfg(feature = "postgres")]
        LedgerBackend::Postgres => {
            use authgate_infra::database::{DatabaseConfig, connect};

            let db_config = DatabaseConfig::from_env()
                .context("LEDGER_BACKEND=postgres requires DATABASE_URL")?;
            let conn = connect(&db_config)
                .await
                .context("Failed to connect to the ledger database")?;

            if db_config.auto_migrate {
                use migration::{Migrator, MigratorTrait};

                Migrator::up(&conn, None)
                    .await
                    .context("Failed to run ledger migrations")?;
                tracing::info!("Ledger migrations applied");
            }
            Ok(Arc::new(authgate_infra::PostgresAttemptLedger::new(conn)))
        }

        #[cfg(feature = "redis")]
        LedgerBackend::Redis => {
            let ledger = authgate_infra::RedisAttemptLedger::from_env()
                .await
                .context("Failed to connect to the Redis ledger")?;
            Ok(Arc::new(ledger))
        }

        #[allow(unreachable_patterns)]
        other => anyhow::bail!("Ledger backend {other:?} is not compiled into this build"),
    }
}

fn build_verifier() -> anyhow::Result<Arc<dyn CredentialVerifier>> {
    #[cfg(feature = "identity")]
    if let Some(identity) = authgate_infra::IdentityConfig::from_env() {
        tracing::info!(url = %identity.url, "Using hosted identity service verifier");
        let verifier = authgate_infra::IdentityServiceVerifier::new(identity)
            .context("Failed to build identity service client")?;
        return Ok(Arc::new(verifier));
    }

    local_verifier()
}

#[cfg(feature = "auth")]
fn local_verifier() -> anyhow::Result<Arc<dyn CredentialVerifier>> {
    use authgate_infra::{JwtSessionIssuer, LocalVerifier};

    tracing::warn!("IDENTITY_URL not set. Using local in-memory verifier.");
    Ok(Arc::new(LocalVerifier::new(Arc::new(
        JwtSessionIssuer::from_env(),
    ))))
}

#[cfg(not(feature = "auth"))]
fn local_verifier() -> anyhow::Result<Arc<dyn CredentialVerifier>> {
    anyhow::bail!("No credential verifier available: set IDENTITY_URL or enable the auth feature")
}

fn build_notifier() -> anyhow::Result<Arc<dyn PasswordChangeNotifier>> {
    #[cfg(feature = "mail")]
    if let Some(mail) = authgate_infra::MailConfig::from_env() {
        tracing::info!(from = %mail.from, "Using mail API notifier");
        let notifier = authgate_infra::MailApiNotifier::new(mail)
            .context("Failed to build mail API client")?;
        return Ok(Arc::new(notifier));
    }

    tracing::info!("NOTIFY_API_KEY not set. Password change notices are logged only.");
    Ok(Arc::new(LogNotifier))
}
