//! Password-change notification port.

use async_trait::async_trait;

use crate::domain::PasswordChangeNotice;

/// Sends the security notice that follows a password change.
#[async_trait]
pub trait PasswordChangeNotifier: Send + Sync {
    async fn notify(&self, notice: &PasswordChangeNotice) -> Result<(), NotifyError>;
}

/// Notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification template error: {0}")]
    Template(String),
}
