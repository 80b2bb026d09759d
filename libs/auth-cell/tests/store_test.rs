use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::models::{AccountKind, AccountRef, TokenEffect, TokenKind};
use auth_cell::services::{AccountTokenStore, SupabaseAccountTokenStore};
use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::TestConfig;

fn store_for(server: &MockServer) -> SupabaseAccountTokenStore {
    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    SupabaseAccountTokenStore::new(SupabaseClient::new(&config))
}

#[tokio::test]
async fn test_find_by_email_encodes_address() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.ana+care@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": id, "email": "ana+care@example.com" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let account = store_for(&mock_server)
        .find_by_email(AccountKind::User, "ana+care@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(account.id, id);
    assert_eq!(account.kind, AccountKind::User);
}

#[tokio::test]
async fn test_store_token_writes_kind_columns() {
    let mock_server = MockServer::start().await;
    let account = AccountRef {
        kind: AccountKind::Professional,
        id: Uuid::new_v4(),
        email: "dr@example.com".to_string(),
    };

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", format!("eq.{}", account.id)))
        .and(body_partial_json(json!({ "reset_token_hash": "abc123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": account.id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    store_for(&mock_server)
        .store_token(&account, TokenKind::Reset, "abc123", Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_consume_token_is_conditional_and_clears_columns() {
    let mock_server = MockServer::start().await;
    let account = AccountRef {
        kind: AccountKind::User,
        id: Uuid::new_v4(),
        email: "ana@example.com".to_string(),
    };
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("verify_token_hash", "eq.abc123"))
        .and(query_param("verify_token_expires_at", "gt.2026-02-01T12:00:00.000000Z"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "email_verified": true,
            "verify_token_hash": null,
            "verify_token_expires_at": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": account.id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let consumed = store_for(&mock_server)
        .consume_token(
            &account,
            "abc123",
            now,
            &TokenEffect::MarkEmailVerified { verified_at: now },
        )
        .await
        .unwrap();

    assert!(consumed);
}

#[tokio::test]
async fn test_consume_token_reports_lost_race() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let account = AccountRef {
        kind: AccountKind::User,
        id: Uuid::new_v4(),
        email: "ana@example.com".to_string(),
    };
    let consumed = store_for(&mock_server)
        .consume_token(
            &account,
            "abc123",
            Utc::now(),
            &TokenEffect::SetPasswordHash("$argon2id$hash".to_string()),
        )
        .await
        .unwrap();

    assert!(!consumed);
}

#[tokio::test]
async fn test_find_by_token_hash_compares_expiry_below_one_second() {
    let mock_server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap() + Duration::milliseconds(750);

    // Only the exact sub-second cutoff is served; a truncated one misses.
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("reset_token_hash", "eq.abc123"))
        .and(query_param("reset_token_expires_at", "gt.2026-02-01T12:00:00.750000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let found = store_for(&mock_server)
        .find_by_token_hash(AccountKind::Professional, TokenKind::Reset, "abc123", now)
        .await
        .unwrap();

    assert!(found.is_none());
}
