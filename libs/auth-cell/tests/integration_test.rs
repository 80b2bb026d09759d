use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::handlers::AuthState;
use auth_cell::models::AccountKind;
use auth_cell::router::auth_routes;
use auth_cell::services::{InMemoryAccountTokenStore, TokenService};
use notification_cell::services::EmailSender;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

/// Keeps every outgoing email so tests can follow the links.
#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    fn token_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, html) = sent.iter().rev().find(|(recipient, _)| recipient == to)?;
        let start = html.find("?token=")? + "?token=".len();
        Some(html[start..start + 64].to_string())
    }
}

#[async_trait]
impl EmailSender for Outbox {
    async fn send(&self, to: &str, _subject: &str, html: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), html.to_string()));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: Arc<InMemoryAccountTokenStore>,
    outbox: Arc<Outbox>,
    config: TestConfig,
}

fn create_test_app() -> TestApp {
    let config = TestConfig::default();
    let store = Arc::new(InMemoryAccountTokenStore::new());
    let outbox = Arc::new(Outbox::default());
    let app_config = config.to_arc();

    let tokens = TokenService::new(store.clone(), outbox.clone(), app_config.clone());
    let router = auth_routes(AuthState {
        config: app_config,
        tokens: Arc::new(tokens),
    });

    TestApp {
        router,
        store,
        outbox,
        config,
    }
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_validate_token_endpoint() {
    let app = create_test_app();
    let user = TestUser::patient("test@example.com");

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", JwtTestUtils::bearer(&user, &app.config.jwt_secret))
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["valid"], true);
    assert_eq!(json_response["user_id"], user.id);
    assert_eq!(json_response["role"], "patient");
}

#[tokio::test]
async fn test_validate_rejects_foreign_signature() {
    let app = create_test_app();
    let user = TestUser::patient("test@example.com");
    let token = JwtTestUtils::create_invalid_signature_token(&user);

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_reports_expired_session_as_invalid() {
    let app = create_test_app();
    let user = TestUser::patient("test@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &app.config.jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["valid"], false);
}

#[tokio::test]
async fn test_email_verification_round_trip() {
    let app = create_test_app();
    let id = app.store.add_account(AccountKind::User, "ana@example.com");

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/resend-verification",
            json!({ "email": "ana@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let token = app.outbox.token_for("ana@example.com").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/verify-email", json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["account_type"], "user");
    assert!(app.store.account(AccountKind::User, id).unwrap().email_verified);

    // Second use of the same link
    let response = app
        .router
        .oneshot(post_json("/verify-email", json!({ "token": token })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = body_json(response).await;
    assert_eq!(json_response["code"], "token_invalid_or_expired");
    assert_eq!(json_response["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_password_reset_round_trip_for_professional() {
    let app = create_test_app();
    let id = app
        .store
        .add_account(AccountKind::Professional, "dr@example.com");

    app.router
        .clone()
        .oneshot(post_json(
            "/forgot-password",
            json!({ "email": "dr@example.com" }),
        ))
        .await
        .unwrap();
    let token = app.outbox.token_for("dr@example.com").unwrap();

    let response = app
        .router
        .oneshot(post_json(
            "/reset-password",
            json!({ "token": token, "new_password": "a-new-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = app.store.account(AccountKind::Professional, id).unwrap();
    assert!(record.password_hash.is_some());
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = create_test_app();
    app.store.add_account(AccountKind::User, "ana@example.com");

    let known = app
        .router
        .clone()
        .oneshot(post_json(
            "/forgot-password",
            json!({ "email": "ana@example.com" }),
        ))
        .await
        .unwrap();
    let unknown = app
        .router
        .oneshot(post_json(
            "/forgot-password",
            json!({ "email": "ghost@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(known.status(), unknown.status());
    assert_eq!(body_json(known).await, body_json(unknown).await);
    assert!(app.outbox.token_for("ghost@example.com").is_none());
}

#[tokio::test]
async fn test_malformed_token_gets_generic_error() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(post_json("/verify-email", json!({ "token": "xyz" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "token_invalid_or_expired");
}

#[tokio::test]
async fn test_short_password_is_invalid_input() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/reset-password",
            json!({ "token": "a".repeat(64), "new_password": "short" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_input");
}
