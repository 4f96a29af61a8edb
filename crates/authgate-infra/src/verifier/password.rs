//! Argon2 hashing for the local verifier, run on the blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::sync::OnceCell;

use authgate_core::ports::VerifierError;

/// Hashes and checks account passwords off the async executor.
///
/// Unknown accounts are checked against a throwaway hash so that a missing
/// account and a wrong password cost the same.
#[derive(Default)]
pub struct AccountHasher {
    argon2: Argon2<'static>,
    decoy: OnceCell<String>,
}

impl AccountHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn hash(&self, password: &str) -> Result<String, VerifierError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| VerifierError::Transport(format!("password hashing failed: {e}")))
        })
        .await
        .map_err(|e| VerifierError::Transport(format!("hashing task failed: {e}")))?
    }

    /// Check `password` against a stored PHC string.
    pub async fn verify(&self, password: &str, stored: &str) -> Result<bool, VerifierError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let stored = stored.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored)
                .map_err(|e| VerifierError::Transport(format!("stored hash unreadable: {e}")))?;
            Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| VerifierError::Transport(format!("hashing task failed: {e}")))?
    }

    /// Spend one verification on the decoy hash. Always reports no match.
    pub async fn burn(&self, password: &str) -> Result<bool, VerifierError> {
        let decoy = self
            .decoy
            .get_or_try_init(|| self.hash("authgate-decoy-password"))
            .await?;
        self.verify(password, decoy).await?;
        Ok(false)
    }
}
