use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which verifier operation an attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthAction {
    #[serde(rename = "signin")]
    SignIn,
    #[serde(rename = "signup")]
    SignUp,
}

impl AuthAction {
    /// Parse the wire name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "signin" => Some(AuthAction::SignIn),
            "signup" => Some(AuthAction::SignUp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthAction::SignIn => "signin",
            AuthAction::SignUp => "signup",
        }
    }
}

/// Session issued by the credential verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Account as reported by the credential verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Successful verification result.
///
/// `session` is absent when the verifier accepted a sign-up that still
/// awaits confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub session: Option<Session>,
    pub user: AuthUser,
}
