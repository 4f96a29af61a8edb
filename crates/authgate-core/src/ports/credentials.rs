//! Session issuing port, used by self-hosted verifiers.

use crate::domain::{AuthUser, Session};

/// Mints the session handed back after a successful local sign-in.
pub trait SessionIssuer: Send + Sync {
    fn issue(&self, user: &AuthUser) -> Result<Session, CredentialError>;
}

/// Session issuing errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Token signing failed: {0}")]
    Signing(String),
}
