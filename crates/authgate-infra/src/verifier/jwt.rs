//! JWT session issuer for the local verifier.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use uuid::Uuid;

use authgate_core::domain::{AuthUser, Session};
use authgate_core::ports::{CredentialError, SessionIssuer};

const DEFAULT_SECRET: &str = "change-me-in-production";
const MAX_EXPIRATION_SECS: i64 = 30 * 24 * 3600;

/// JWT session configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_secs: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_secs: 3600,
            issuer: "authgate".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load from `JWT_SECRET`, `JWT_EXPIRATION_SECS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_secs: std::env::var("JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| (1..=MAX_EXPIRATION_SECS).contains(secs))
                .unwrap_or(3600),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 session issuer.
pub struct JwtSessionIssuer {
    encoding_key: EncodingKey,
    config: JwtConfig,
}

impl JwtSessionIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl SessionIssuer for JwtSessionIssuer {
    fn issue(&self, user: &AuthUser) -> Result<Session, CredentialError> {
        let now = Utc::now();
        let exp = now + TimeDelta::seconds(self.config.expiration_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))?;

        Ok(Session {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.config.expiration_secs,
            expires_at: Some(exp.timestamp()),
            refresh_token: Some(Uuid::new_v4().simple().to_string()),
        })
    }

}
