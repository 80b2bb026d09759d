use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const RAW_TOKEN_BYTES: usize = 32;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Verify,
    Reset,
}

impl TokenKind {
    pub fn hash_column(&self) -> &'static str {
        match self {
            TokenKind::Verify => "verify_token_hash",
            TokenKind::Reset => "reset_token_hash",
        }
    }

    pub fn expires_column(&self) -> &'static str {
        match self {
            TokenKind::Verify => "verify_token_expires_at",
            TokenKind::Reset => "reset_token_expires_at",
        }
    }

    /// Page of the web app that redeems this kind of token.
    pub fn link_path(&self) -> &'static str {
        match self {
            TokenKind::Verify => "verify-email",
            TokenKind::Reset => "reset-password",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    User,
    Professional,
}

impl AccountKind {
    /// Accounts are searched in this order; the first match wins.
    pub const LOOKUP_ORDER: [AccountKind; 2] = [AccountKind::User, AccountKind::Professional];

    pub fn table(&self) -> &'static str {
        match self {
            AccountKind::User => "users",
            AccountKind::Professional => "professionals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub kind: AccountKind,
    pub id: Uuid,
    pub email: String,
}

/// Freshly minted token. Only `hash` and `expires_at` are ever persisted.
#[derive(Clone)]
pub struct IssuedToken {
    pub raw_token: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("raw_token", &"<redacted>")
            .field("hash", &self.hash)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Account change applied in the same write that consumes the token.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenEffect {
    MarkEmailVerified { verified_at: DateTime<Utc> },
    SetPasswordHash(String),
}

impl TokenEffect {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenEffect::MarkEmailVerified { .. } => TokenKind::Verify,
            TokenEffect::SetPasswordHash(_) => TokenKind::Reset,
        }
    }
}

impl fmt::Debug for TokenEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenEffect::MarkEmailVerified { verified_at } => f
                .debug_struct("MarkEmailVerified")
                .field("verified_at", verified_at)
                .finish(),
            TokenEffect::SetPasswordHash(_) => f.write_str("SetPasswordHash(<redacted>)"),
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidOrExpired => AppError::TokenInvalidOrExpired,
            TokenError::ValidationError(msg) => AppError::ValidationError(msg),
            TokenError::HashingError(msg) => AppError::Internal(msg),
            TokenError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
