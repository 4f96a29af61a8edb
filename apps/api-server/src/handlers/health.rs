//! Health check endpoint.

use actix_web::{HttpResponse, web};

use authgate_shared::HealthResponse;

use crate::state::AppState;

/// Health check endpoint - returns server status and the ledger backend.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger: state.gateway.ledger().backend_name().to_string(),
    };

    HttpResponse::Ok().json(response)
}
