//! Error handling - maps gateway outcomes onto HTTP responses.

use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use authgate_core::GatewayError;
use authgate_shared::ErrorBody;

pub const RATE_LIMITED_MESSAGE: &str = "Too many login attempts. Please try again later.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const THROTTLED_MESSAGE: &str = "Too many requests. Please slow down.";

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited for {retry_after}s after {attempts_count} failures")]
    RateLimited { retry_after: u64, attempts_count: u64 },

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        attempts_remaining: u64,
    },

    #[error("Throttled for {retry_after}s")]
    Throttled { retry_after: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } | AppError::Throttled { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let body = match self {
            AppError::BadRequest(message) => ErrorBody::new(message),
            AppError::RateLimited {
                retry_after,
                attempts_count,
            } => {
                builder.insert_header((RETRY_AFTER, retry_after.to_string()));
                ErrorBody::rate_limited(RATE_LIMITED_MESSAGE, *retry_after, *attempts_count)
            }
            AppError::Unauthorized {
                message,
                attempts_remaining,
            } => ErrorBody::rejected(message, *attempts_remaining),
            AppError::Throttled { retry_after } => {
                builder.insert_header((RETRY_AFTER, retry_after.to_string()));
                ErrorBody::new(THROTTLED_MESSAGE)
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                ErrorBody::new(INTERNAL_MESSAGE)
            }
        };

        builder.json(body)
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidRequest(message) => AppError::BadRequest(message),
            GatewayError::RateLimited {
                retry_after_seconds,
                attempts_count,
            } => AppError::RateLimited {
                retry_after: retry_after_seconds,
                attempts_count,
            },
            GatewayError::VerifierRejected {
                message,
                attempts_remaining,
            } => AppError::Unauthorized {
                message,
                attempts_remaining,
            },
            GatewayError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
