//! Credential verifier port - the identity backend behind the gateway.

use async_trait::async_trait;

use crate::domain::VerifiedIdentity;

/// Credential verifier trait - performs the actual credential check.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify an existing account's email and password.
    async fn sign_in(&self, email: &str, password: &str)
    -> Result<VerifiedIdentity, VerifierError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<VerifiedIdentity, VerifierError>;
}

/// Verifier errors.
///
/// `Rejected` is a credential failure and counts against the key;
/// `Transport` is an infrastructure fault and does not.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("{0}")]
    Rejected(String),

    #[error("Verifier transport error: {0}")]
    Transport(String),
}
