//! Password-change notification handler.

use actix_web::{HttpResponse, web};

use authgate_core::domain::{PasswordChangeNotice, mask_email};
use authgate_shared::{AcceptedResponse, PasswordChangeRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const EMAIL_REQUIRED: &str = "Email is required";

/// POST /api/notifications/password-changed
///
/// The notice is sent in the background; delivery failures are logged and
/// never reach the caller.
pub async fn password_changed(
    state: web::Data<AppState>,
    body: web::Json<PasswordChangeRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let email = body
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest(EMAIL_REQUIRED.to_string()))?;

    let notice = PasswordChangeNotice::new(email, body.user_name);
    let notifier = state.notifier.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = notifier.notify(&notice).await {
            tracing::error!(
                email = %mask_email(&notice.email),
                error = %e,
                "Failed to send password change notification"
            );
        }
    });

    Ok(HttpResponse::Accepted().json(AcceptedResponse::ok()))
}
