//! Response bodies shared by every endpoint.

use serde::{Deserialize, Serialize};

/// Error body. Rate-limit and rejection details ride along as optional
/// camelCase fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry_after: None,
            attempts_count: None,
            attempts_remaining: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: u64, attempts_count: u64) -> Self {
        Self {
            retry_after: Some(retry_after),
            attempts_count: Some(attempts_count),
            ..Self::new(message)
        }
    }

    pub fn rejected(message: impl Into<String>, attempts_remaining: u64) -> Self {
        Self {
            attempts_remaining: Some(attempts_remaining),
            ..Self::new(message)
        }
    }
}

/// `202` acknowledgement for fire-and-forget endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub success: bool,
}

impl AcceptedResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ledger: String,
}
