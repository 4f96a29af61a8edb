//! Hosted identity service verifier (GoTrue-compatible REST API).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use authgate_core::domain::{AuthUser, Session, VerifiedIdentity};
use authgate_core::ports::{CredentialVerifier, VerifierError};

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL, e.g. `https://project.example.co`
    pub url: String,
    /// Public API key sent as `apikey` and bearer token
    pub anon_key: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl IdentityConfig {
    /// Load from `IDENTITY_URL` and `IDENTITY_ANON_KEY`. Returns `None`
    /// unless both are set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("IDENTITY_URL").ok()?;
        let anon_key = std::env::var("IDENTITY_ANON_KEY").ok()?;

        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            timeout: Duration::from_secs(
                std::env::var("AUTH_VERIFIER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }
}

/// Verifier that delegates to a hosted identity service.
///
/// 4xx responses are credential rejections. 5xx responses and transport
/// failures are reported as `Transport` and never count against a key.
pub struct IdentityServiceVerifier {
    client: Client,
    config: IdentityConfig,
}

impl IdentityServiceVerifier {
    pub fn new(config: IdentityConfig) -> Result<Self, VerifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, VerifierError> {
        let url = format!("{}{}", self.config.url, path);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        classify(status, payload)
    }
}

/// Sort a response into success, credential rejection or service fault.
///
/// Upstream throttling and a refused API key are faults of this gateway's
/// own access, never of the end user's credentials.
fn classify(status: StatusCode, payload: Value) -> Result<Value, VerifierError> {
    if status.is_success() {
        return Ok(payload);
    }

    let message = rejection_message(&payload);
    let gateway_fault = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::UNAUTHORIZED && is_api_key_error(&message));

    if status.is_client_error() && !gateway_fault {
        Err(VerifierError::Rejected(message))
    } else {
        tracing::warn!(status = %status, message = %message, "Identity service refused the gateway");
        Err(VerifierError::Transport(format!(
            "identity service responded with {status}"
        )))
    }
}

fn is_api_key_error(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("api key") || message.contains("apikey")
}

/// Human-readable message from an error payload.
fn rejection_message(payload: &Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|field| payload.get(field).and_then(Value::as_str))
        .unwrap_or("Authentication failed")
        .to_string()
}

fn parse_session(payload: &Value) -> Option<Session> {
    let access_token = payload.get("access_token")?.as_str()?.to_string();

    Some(Session {
        access_token,
        token_type: payload
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("bearer")
            .to_string(),
        expires_in: payload.get("expires_in").and_then(Value::as_i64).unwrap_or(0),
        expires_at: payload.get("expires_at").and_then(Value::as_i64),
        refresh_token: payload
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn parse_user(value: &Value) -> Option<AuthUser> {
    let id = value.get("id")?.as_str()?.to_string();

    Some(AuthUser {
        id,
        email: value.get("email").and_then(Value::as_str).map(str::to_string),
        full_name: value
            .pointer("/user_metadata/full_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: value
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

/// Session responses nest the user; unconfirmed sign-ups return it bare.
fn parse_identity(payload: &Value) -> Result<VerifiedIdentity, VerifierError> {
    let session = parse_session(payload);
    let user = payload
        .get("user")
        .and_then(parse_user)
        .or_else(|| parse_user(payload))
        .ok_or_else(|| {
            VerifierError::Transport("identity service response had no user".to_string())
        })?;

    Ok(VerifiedIdentity { session, user })
}

#[async_trait]
impl CredentialVerifier for IdentityServiceVerifier {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerifierError> {
        let payload = self
            .post(
                "/auth/v1/token?grant_type=password",
                json!({ "email": email, "password": password }),
            )
            .await?;

        parse_identity(&payload)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<VerifiedIdentity, VerifierError> {
        let payload = self
            .post(
                "/auth/v1/signup",
                json!({
                    "email": email,
                    "password": password,
                    "data": { "full_name": full_name },
                }),
            )
            .await?;

        parse_identity(&payload)
    }
}
