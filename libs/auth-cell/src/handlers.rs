use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token;

use crate::models::{EmailRequest, ResetPasswordRequest, VerifyEmailRequest};
use crate::services::TokenService;

const LINK_SENT_MESSAGE: &str = "If an account exists for this address, an email is on its way";

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
}

// ==============================================================================
// SESSION INTROSPECTION
// ==============================================================================

pub async fn validate_session(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;
    let user = validate_token(token, &state.config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_session(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = validate_token(token, &state.config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

// ==============================================================================
// ACCOUNT TOKENS
// ==============================================================================

#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AuthState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let account = state.tokens.verify_email(request.token.trim()).await?;

    Ok(Json(json!({
        "success": true,
        "account_type": account.kind,
    })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AuthState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .tokens
        .reset_password(request.token.trim(), &request.new_password)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated",
    })))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    state.tokens.request_password_reset(&request.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": LINK_SENT_MESSAGE,
    })))
}

#[axum::debug_handler]
pub async fn resend_verification(
    State(state): State<AuthState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    state.tokens.request_verification(&request.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": LINK_SENT_MESSAGE,
    })))
}
