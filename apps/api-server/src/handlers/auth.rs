//! Rate-limited authentication handler.

use actix_web::{HttpRequest, HttpResponse, web};

use authgate_core::AuthRequest;
use authgate_core::domain::{AuthUser, Session, VerifiedIdentity};
use authgate_shared::{AuthRequestBody, AuthSuccessBody, SessionBody, UserBody};

use crate::middleware::client_ip::extract_client_ip;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn session_body(session: Session) -> SessionBody {
    SessionBody {
        access_token: session.access_token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        expires_at: session.expires_at,
        refresh_token: session.refresh_token,
    }
}

fn user_body(user: AuthUser) -> UserBody {
    UserBody {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        created_at: user.created_at,
    }
}

fn success_body(identity: VerifiedIdentity) -> AuthSuccessBody {
    AuthSuccessBody {
        session: identity.session.map(session_body),
        user: user_body(identity.user),
    }
}

/// POST /api/auth
pub async fn authenticate(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AuthRequestBody>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let request = AuthRequest {
        ip_address: extract_client_ip(&req),
        email: body.email,
        password: body.password,
        action: body.action,
        full_name: body.full_name,
    };

    let identity = state.gateway.handle(request).await?;

    Ok(HttpResponse::Ok().json(success_body(identity)))
}
