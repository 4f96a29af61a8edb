//! Self-hosted credential verifier: Argon2 hashes held in memory, JWT sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use authgate_core::domain::{AuthUser, VerifiedIdentity};
use authgate_core::ports::{CredentialVerifier, SessionIssuer, VerifierError};

use super::password::AccountHasher;

pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";
pub const ALREADY_REGISTERED: &str = "User already registered";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
struct StoredAccount {
    user: AuthUser,
    password_hash: String,
}

/// Verifier for deployments without an external identity service.
///
/// Accounts live for the lifetime of the process. Sign-ups are confirmed
/// immediately and receive a session. Hashing never happens under the
/// accounts lock.
pub struct LocalVerifier {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    hasher: AccountHasher,
    sessions: Arc<dyn SessionIssuer>,
}

impl LocalVerifier {
    pub fn new(sessions: Arc<dyn SessionIssuer>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            hasher: AccountHasher::new(),
            sessions,
        }
    }

    fn lookup_key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn identity_for(&self, user: &AuthUser) -> Result<VerifiedIdentity, VerifierError> {
        let session = self
            .sessions
            .issue(user)
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        Ok(VerifiedIdentity {
            session: Some(session),
            user: user.clone(),
        })
    }
}

#[async_trait]
impl CredentialVerifier for LocalVerifier {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerifierError> {
        let account = self
            .accounts
            .read()
            .await
            .get(&Self::lookup_key(email))
            .cloned();

        let matches = match &account {
            Some(account) => self.hasher.verify(password, &account.password_hash).await?,
            None => self.hasher.burn(password).await?,
        };

        match account {
            Some(account) if matches => self.identity_for(&account.user),
            _ => Err(VerifierError::Rejected(INVALID_CREDENTIALS.to_string())),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<VerifiedIdentity, VerifierError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(VerifierError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let key = Self::lookup_key(email);
        if self.accounts.read().await.contains_key(&key) {
            return Err(VerifierError::Rejected(ALREADY_REGISTERED.to_string()));
        }

        let password_hash = self.hasher.hash(password).await?;

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.trim().to_string()),
            full_name: full_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            created_at: Some(Utc::now()),
        };
        let identity = self.identity_for(&user)?;

        let mut accounts = self.accounts.write().await;
        // Another sign-up may have won while we were hashing.
        if accounts.contains_key(&key) {
            return Err(VerifierError::Rejected(ALREADY_REGISTERED.to_string()));
        }
        tracing::info!(user_id = %user.id, "Registered local account");
        accounts.insert(
            key,
            StoredAccount {
                user,
                password_hash,
            },
        );

        Ok(identity)
    }
}
