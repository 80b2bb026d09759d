use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AccountKind, AccountRef, TokenEffect, TokenKind};

/// Token columns on the `users` and `professionals` tables.
#[async_trait]
pub trait AccountTokenStore: Send + Sync {
    async fn find_by_email(&self, account: AccountKind, email: &str) -> Result<Option<AccountRef>>;

    /// Overwrites any earlier token of the same kind.
    async fn store_token(
        &self,
        account: &AccountRef,
        kind: TokenKind,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Account holding an unexpired token with this hash.
    async fn find_by_token_hash(
        &self,
        account: AccountKind,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountRef>>;

    /// Applies `effect` and clears the token in one conditional write.
    /// Returns `false` when the token was already gone.
    async fn consume_token(
        &self,
        account: &AccountRef,
        hash: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    id: Uuid,
    email: String,
}

impl AccountRow {
    fn into_ref(self, kind: AccountKind) -> AccountRef {
        AccountRef {
            kind,
            id: self.id,
            email: self.email,
        }
    }
}

pub struct SupabaseAccountTokenStore {
    supabase: SupabaseClient,
}

impl SupabaseAccountTokenStore {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

// Full precision so `gt.` comparisons against expiries stay strict.
fn query_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn effect_columns(effect: &TokenEffect) -> Value {
    match effect {
        TokenEffect::MarkEmailVerified { verified_at } => json!({
            "email_verified": true,
            "email_verified_at": verified_at,
        }),
        TokenEffect::SetPasswordHash(password_hash) => json!({
            "password_hash": password_hash,
        }),
    }
}

#[async_trait]
impl AccountTokenStore for SupabaseAccountTokenStore {
    async fn find_by_email(&self, account: AccountKind, email: &str) -> Result<Option<AccountRef>> {
        let path = format!(
            "/rest/v1/{}?email=eq.{}&select=id,email",
            account.table(),
            urlencoding::encode(email)
        );
        let rows: Vec<AccountRow> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().next().map(|row| row.into_ref(account)))
    }

    async fn store_token(
        &self,
        account: &AccountRef,
        kind: TokenKind,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        debug!("Storing {:?} token for {:?} {}", kind, account.kind, account.id);

        let mut body = json!({});
        body[kind.hash_column()] = json!(hash);
        body[kind.expires_column()] = json!(expires_at);

        let path = format!("/rest/v1/{}?id=eq.{}", account.kind.table(), account.id);
        self.supabase
            .write_returning(Method::PATCH, &path, body)
            .await?;

        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        account: AccountKind,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountRef>> {
        let path = format!(
            "/rest/v1/{}?{}=eq.{}&{}=gt.{}&select=id,email",
            account.table(),
            kind.hash_column(),
            hash,
            kind.expires_column(),
            query_timestamp(now)
        );
        let rows: Vec<AccountRow> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(rows.into_iter().next().map(|row| row.into_ref(account)))
    }

    async fn consume_token(
        &self,
        account: &AccountRef,
        hash: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<bool> {
        let kind = effect.kind();

        let mut body = effect_columns(effect);
        body[kind.hash_column()] = Value::Null;
        body[kind.expires_column()] = Value::Null;

        let path = format!(
            "/rest/v1/{}?id=eq.{}&{}=eq.{}&{}=gt.{}",
            account.kind.table(),
            account.id,
            kind.hash_column(),
            hash,
            kind.expires_column(),
            query_timestamp(now)
        );
        let rows = self
            .supabase
            .write_returning(Method::PATCH, &path, body)
            .await?;

        Ok(!rows.is_empty())
    }
}
