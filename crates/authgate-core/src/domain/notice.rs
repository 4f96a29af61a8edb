use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Out-of-band notice sent after an account's password changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChangeNotice {
    pub email: String,
    pub user_name: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl PasswordChangeNotice {
    pub fn new(email: impl Into<String>, user_name: Option<String>) -> Self {
        Self {
            email: email.into(),
            user_name: user_name.filter(|n| !n.trim().is_empty()),
            changed_at: Utc::now(),
        }
    }

    /// Name used in the greeting line.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("User")
    }
}
