use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AccountKind, AccountRef, TokenEffect, TokenKind};
use crate::services::store::AccountTokenStore;

#[derive(Debug, Clone)]
pub struct StoredToken {
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub tokens: HashMap<TokenKind, StoredToken>,
}

/// Process-local account table for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryAccountTokenStore {
    accounts: RwLock<HashMap<(AccountKind, Uuid), AccountRecord>>,
}

impl InMemoryAccountTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, kind: AccountKind, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(
                (kind, id),
                AccountRecord {
                    id,
                    email: email.to_string(),
                    email_verified: false,
                    email_verified_at: None,
                    password_hash: None,
                    tokens: HashMap::new(),
                },
            );
        }
        id
    }

    pub fn account(&self, kind: AccountKind, id: Uuid) -> Option<AccountRecord> {
        self.accounts
            .read()
            .ok()
            .and_then(|accounts| accounts.get(&(kind, id)).cloned())
    }
}

fn to_ref(kind: AccountKind, record: &AccountRecord) -> AccountRef {
    AccountRef {
        kind,
        id: record.id,
        email: record.email.clone(),
    }
}

fn holds_live_token(record: &AccountRecord, kind: TokenKind, hash: &str, now: DateTime<Utc>) -> bool {
    record
        .tokens
        .get(&kind)
        .map(|t| t.hash == hash && t.expires_at > now)
        .unwrap_or(false)
}

#[async_trait]
impl AccountTokenStore for InMemoryAccountTokenStore {
    async fn find_by_email(&self, account: AccountKind, email: &str) -> Result<Option<AccountRef>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;

        Ok(accounts
            .iter()
            .find(|((kind, _), record)| *kind == account && record.email == email)
            .map(|(_, record)| to_ref(account, record)))
    }

    async fn store_token(
        &self,
        account: &AccountRef,
        kind: TokenKind,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;

        let record = accounts
            .get_mut(&(account.kind, account.id))
            .ok_or_else(|| anyhow!("account {} not found", account.id))?;
        record.tokens.insert(
            kind,
            StoredToken {
                hash: hash.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        account: AccountKind,
        kind: TokenKind,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountRef>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;

        Ok(accounts
            .iter()
            .find(|((k, _), record)| *k == account && holds_live_token(record, kind, hash, now))
            .map(|(_, record)| to_ref(account, record)))
    }

    async fn consume_token(
        &self,
        account: &AccountRef,
        hash: &str,
        now: DateTime<Utc>,
        effect: &TokenEffect,
    ) -> Result<bool> {
        let kind = effect.kind();
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;

        let record = match accounts.get_mut(&(account.kind, account.id)) {
            Some(record) if holds_live_token(record, kind, hash, now) => record,
            _ => return Ok(false),
        };

        match effect {
            TokenEffect::MarkEmailVerified { verified_at } => {
                record.email_verified = true;
                record.email_verified_at = Some(*verified_at);
            }
            TokenEffect::SetPasswordHash(password_hash) => {
                record.password_hash = Some(password_hash.clone());
            }
        }
        record.tokens.remove(&kind);

        Ok(true)
    }
}
