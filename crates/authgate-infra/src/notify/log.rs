//! Log-only notifier for development.

use async_trait::async_trait;

use authgate_core::domain::{PasswordChangeNotice, mask_email};
use authgate_core::ports::{NotifyError, PasswordChangeNotifier};

/// Writes the notice to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl PasswordChangeNotifier for LogNotifier {
    async fn notify(&self, notice: &PasswordChangeNotice) -> Result<(), NotifyError> {
        tracing::info!(
            email = %mask_email(&notice.email),
            user_name = %notice.display_name(),
            changed_at = %notice.changed_at,
            "Password change notice (not sent, log notifier)"
        );
        Ok(())
    }
}
