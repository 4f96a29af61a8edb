//! CORS headers for browser clients.

use actix_web::HttpResponse;
use actix_web::middleware::DefaultHeaders;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Headers attached to every response.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", ALLOW_ORIGIN))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
}

/// OPTIONS preflight: 200 with no body.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}
