//! HTTP handlers and route configuration.

mod auth;
mod health;
mod notify;

use actix_web::{HttpResponse, error::InternalError, web};

use authgate_shared::ErrorBody;

use crate::middleware::cors;

const INVALID_BODY: &str = "Invalid request body";

/// Malformed JSON is a client error with the usual error body.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected malformed request body");
        InternalError::from_response(err, HttpResponse::BadRequest().json(ErrorBody::new(INVALID_BODY)))
            .into()
    })
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/functions/v1/rate-limited-auth")
                .route(web::post().to(auth::authenticate))
                .route(web::method(actix_web::http::Method::OPTIONS).to(cors::preflight)),
        )
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health_check))
                .service(
                    web::resource("/auth")
                        .route(web::post().to(auth::authenticate))
                        .route(web::method(actix_web::http::Method::OPTIONS).to(cors::preflight)),
                )
                .service(
                    web::resource("/notifications/password-changed")
                        .route(web::post().to(notify::password_changed))
                        .route(web::method(actix_web::http::Method::OPTIONS).to(cors::preflight)),
                ),
        );
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::{Arc, Mutex};

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone, Utc};
    use serde_json::{Value, json};

    use authgate_core::domain::{AttemptKey, AuthUser, PasswordChangeNotice, Session, VerifiedIdentity};
    use authgate_core::ports::{
        AttemptLedger, CredentialVerifier, ManualClock, NotifyError, PasswordChangeNotifier,
        VerifierError,
    };
    use authgate_core::{AuthGateway, GatewayConfig};
    use authgate_infra::{InMemoryAttemptLedger, RequestThrottle};

    use super::*;
    use crate::middleware::error::RATE_LIMITED_MESSAGE;
    use crate::middleware::throttle::ThrottleMiddleware;
    use crate::state::AppState;

    const PASSWORD: &str = "correct horse";

    struct FixedVerifier;

    #[async_trait]
    impl CredentialVerifier for FixedVerifier {
        async fn sign_in(
            &self,
            email: &str,
            password: &str,
        ) -> Result<VerifiedIdentity, VerifierError> {
            if password != PASSWORD {
                return Err(VerifierError::Rejected("Invalid login credentials".to_string()));
            }
            Ok(VerifiedIdentity {
                session: Some(Session {
                    access_token: "token".to_string(),
                    token_type: "bearer".to_string(),
                    expires_in: 3600,
                    expires_at: None,
                    refresh_token: None,
                }),
                user: AuthUser {
                    id: "user-1".to_string(),
                    email: Some(email.to_string()),
                    full_name: None,
                    created_at: None,
                },
            })
        }

        async fn sign_up(
            &self,
            email: &str,
            _password: &str,
            full_name: Option<&str>,
        ) -> Result<VerifiedIdentity, VerifierError> {
            Ok(VerifiedIdentity {
                session: None,
                user: AuthUser {
                    id: "user-2".to_string(),
                    email: Some(email.to_string()),
                    full_name: full_name.map(str::to_string),
                    created_at: None,
                },
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<PasswordChangeNotice>>,
    }

    #[async_trait]
    impl PasswordChangeNotifier for RecordingNotifier {
        async fn notify(&self, notice: &PasswordChangeNotice) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    struct Harness {
        state: AppState,
        ledger: Arc<InMemoryAttemptLedger>,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(InMemoryAttemptLedger::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());

        let gateway = AuthGateway::new(
            ledger.clone(),
            Arc::new(FixedVerifier),
            clock.clone(),
            GatewayConfig::default(),
        );

        Harness {
            state: AppState::new(Arc::new(gateway), notifier.clone()),
            ledger,
            clock,
            notifier,
        }
    }

    fn auth_request(password: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/auth")
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .set_json(json!({
                "email": "x@example.com",
                "password": password,
                "action": "signin",
            }))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors::cors_headers())
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_successful_sign_in() {
        let h = harness();
        let app = app!(h.state.clone());

        let resp = test::call_service(&app, auth_request(PASSWORD).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["session"]["access_token"], "token");
        assert_eq!(body["user"]["id"], "user-1");
    }

    #[actix_web::test]
    async fn test_rejection_then_block_with_retry_after() {
        let h = harness();
        let app = app!(h.state.clone());

        for expected_remaining in (0..5).rev() {
            let resp = test::call_service(&app, auth_request("wrong").to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Invalid login credentials");
            assert_eq!(body["attemptsRemaining"], expected_remaining);
            h.clock.advance(TimeDelta::seconds(10));
        }

        let resp = test::call_service(&app, auth_request(PASSWORD).to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        // Oldest failure is 50s old in a 900s window
        assert_eq!(resp.headers().get("Retry-After").unwrap(), "850");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], RATE_LIMITED_MESSAGE);
        assert_eq!(body["retryAfter"], 850);
        assert_eq!(body["attemptsCount"], 5);

        // The blocked attempt wrote nothing
        assert_eq!(h.ledger.len().await, 5);
    }

    #[actix_web::test]
    async fn test_forwarded_address_keys_the_ledger() {
        let h = harness();
        let app = app!(h.state.clone());

        test::call_service(&app, auth_request("wrong").to_request()).await;

        let key = AttemptKey::new("203.0.113.9", "x@example.com");
        let count = h
            .ledger
            .count_failures_in_window(&key, Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn test_validation_errors() {
        let h = harness();
        let app = app!(h.state.clone());

        let missing = test::TestRequest::post()
            .uri("/api/auth")
            .set_json(json!({ "email": "x@example.com", "action": "signin" }))
            .to_request();
        let resp = test::call_service(&app, missing).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Missing required fields" }));

        let invalid = test::TestRequest::post()
            .uri("/functions/v1/rate-limited-auth")
            .set_json(json!({ "email": "x@example.com", "password": "p", "action": "reset" }))
            .to_request();
        let resp = test::call_service(&app, invalid).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid action" }));

        let malformed = test::TestRequest::post()
            .uri("/api/auth")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, malformed).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": INVALID_BODY }));

        assert!(h.ledger.is_empty().await);
    }

    #[actix_web::test]
    async fn test_sign_up_without_session() {
        let h = harness();
        let app = app!(h.state.clone());

        let req = test::TestRequest::post()
            .uri("/api/auth")
            .set_json(json!({
                "email": "new@example.com",
                "password": "secret1",
                "action": "signup",
                "fullName": "New User",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["session"].is_null());
        assert_eq!(body["user"]["full_name"], "New User");
    }

    #[actix_web::test]
    async fn test_preflight_has_cors_and_no_body() {
        let h = harness();
        let app = app!(h.state.clone());

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/auth")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Headers").unwrap(),
            cors::ALLOW_HEADERS
        );
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn test_password_change_notification() {
        let h = harness();
        let app = app!(h.state.clone());

        let req = test::TestRequest::post()
            .uri("/api/notifications/password-changed")
            .set_json(json!({ "email": "x@example.com", "userName": "Rana" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "success": true }));

        // Dispatch runs on a spawned task
        for _ in 0..50 {
            if !h.notifier.sent.lock().unwrap().is_empty() {
                break;
            }
            actix_web::rt::task::yield_now().await;
        }
        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].display_name(), "Rana");
    }

    #[actix_web::test]
    async fn test_password_change_requires_email() {
        let h = harness();
        let app = app!(h.state.clone());

        let req = test::TestRequest::post()
            .uri("/api/notifications/password-changed")
            .set_json(json!({ "userName": "Rana" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Email is required" }));
    }

    #[actix_web::test]
    async fn test_health_reports_ledger() {
        let h = harness();
        let app = app!(h.state.clone());

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ledger"], "memory");
    }

    #[actix_web::test]
    async fn test_throttle_answers_429() {
        let h = harness();
        let throttle = Arc::new(RequestThrottle::new(NonZeroU32::new(1).unwrap()));
        let app = test::init_service(
            App::new()
                .wrap(ThrottleMiddleware::new(Some(throttle)))
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure_routes),
        )
        .await;

        let health = || {
            test::TestRequest::get()
                .uri("/api/health")
                .insert_header(("X-Real-IP", "198.51.100.1"))
                .to_request()
        };

        let resp = test::call_service(&app, health()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, health()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().get("Retry-After").is_some());
    }
}
