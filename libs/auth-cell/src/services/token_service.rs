use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

use notification_cell::services::EmailSender;
use shared_config::AppConfig;

use crate::models::{AccountKind, AccountRef, IssuedToken, TokenEffect, TokenError, TokenKind};
use crate::services::store::AccountTokenStore;
use crate::services::tokens::{
    hash_password, hash_token, is_well_formed, issue_raw_token, validate_new_password,
};

/// Single-use email verification and password reset tokens.
pub struct TokenService {
    store: Arc<dyn AccountTokenStore>,
    email: Arc<dyn EmailSender>,
    config: Arc<AppConfig>,
}

impl TokenService {
    pub fn new(
        store: Arc<dyn AccountTokenStore>,
        email: Arc<dyn EmailSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            email,
            config,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Verify => Duration::minutes(self.config.verify_token_ttl_minutes),
            TokenKind::Reset => Duration::minutes(self.config.reset_token_ttl_minutes),
        }
    }

    /// Replaces any outstanding token of this kind and hands back the raw value.
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    pub async fn issue_token(
        &self,
        account: &AccountRef,
        kind: TokenKind,
    ) -> Result<IssuedToken, TokenError> {
        let issued = issue_raw_token(self.ttl(kind));

        self.store
            .store_token(account, kind, &issued.hash, issued.expires_at)
            .await
            .map_err(|e| TokenError::DatabaseError(e.to_string()))?;

        debug!("Issued {:?} token expiring at {}", kind, issued.expires_at);
        Ok(issued)
    }

    /// Finds the holder of `raw_token` and applies `effect` while consuming it.
    /// Unknown, expired, already used and malformed tokens all fail the same way.
    #[instrument(skip(self, raw_token, effect), fields(kind = ?effect.kind()))]
    pub async fn redeem_token(
        &self,
        raw_token: &str,
        effect: TokenEffect,
    ) -> Result<AccountRef, TokenError> {
        if !is_well_formed(raw_token) {
            debug!("Rejecting malformed token");
            return Err(TokenError::InvalidOrExpired);
        }

        let kind = effect.kind();
        let hash = hash_token(raw_token);
        let now = Utc::now();

        for account_kind in AccountKind::LOOKUP_ORDER {
            let holder = self
                .store
                .find_by_token_hash(account_kind, kind, &hash, now)
                .await
                .map_err(|e| TokenError::DatabaseError(e.to_string()))?;

            let Some(account) = holder else {
                continue;
            };

            let consumed = self
                .store
                .consume_token(&account, &hash, now, &effect)
                .await
                .map_err(|e| TokenError::DatabaseError(e.to_string()))?;

            if !consumed {
                warn!("Token for {} was consumed concurrently", account.id);
                return Err(TokenError::InvalidOrExpired);
            }

            info!("Redeemed {:?} token for {:?} {}", kind, account.kind, account.id);
            return Ok(account);
        }

        Err(TokenError::InvalidOrExpired)
    }

    pub async fn verify_email(&self, raw_token: &str) -> Result<AccountRef, TokenError> {
        self.redeem_token(
            raw_token,
            TokenEffect::MarkEmailVerified {
                verified_at: Utc::now(),
            },
        )
        .await
    }

    /// The password is checked and hashed before the token is looked at.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<AccountRef, TokenError> {
        validate_new_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        self.redeem_token(raw_token, TokenEffect::SetPasswordHash(password_hash))
            .await
    }

    async fn find_account(&self, email: &str) -> Result<Option<AccountRef>, TokenError> {
        for kind in AccountKind::LOOKUP_ORDER {
            let account = self
                .store
                .find_by_email(kind, email)
                .await
                .map_err(|e| TokenError::DatabaseError(e.to_string()))?;
            if account.is_some() {
                return Ok(account);
            }
        }
        Ok(None)
    }

    /// Issues a token and emails the redemption link. Succeeds whether or not
    /// the address belongs to an account.
    async fn send_link(&self, email: &str, kind: TokenKind) -> Result<(), TokenError> {
        let email = email.trim();
        let Some(account) = self.find_account(email).await? else {
            debug!("No account for requested {:?} link", kind);
            return Ok(());
        };

        let issued = self.issue_token(&account, kind).await?;
        let link = format!(
            "{}/{}?token={}",
            self.config.app_base_url.trim_end_matches('/'),
            kind.link_path(),
            issued.raw_token
        );

        let (subject, html) = match kind {
            TokenKind::Verify => (
                "Verify your email address",
                format!(
                    "<p>Confirm your email address by opening the link below.</p><p><a href=\"{0}\">{0}</a></p>",
                    link
                ),
            ),
            TokenKind::Reset => (
                "Reset your password",
                format!(
                    "<p>We received a request to reset your password. The link expires in {} minutes.</p><p><a href=\"{1}\">{1}</a></p><p>If you did not ask for this, you can ignore this email.</p>",
                    self.config.reset_token_ttl_minutes, link
                ),
            ),
        };

        if let Err(e) = self.email.send(&account.email, subject, &html).await {
            warn!("Failed to send {:?} email to account {}: {:#}", kind, account.id, e);
        }

        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), TokenError> {
        self.send_link(email, TokenKind::Reset).await
    }

    #[instrument(skip_all)]
    pub async fn request_verification(&self, email: &str) -> Result<(), TokenError> {
        self.send_link(email, TokenKind::Verify).await
    }
}
