use axum::{routing::post, Router};

use crate::handlers::{self, AuthState};

pub fn auth_routes(state: AuthState) -> Router {
    // Token redemption authenticates by the token itself, so nothing here
    // sits behind the session middleware.
    Router::new()
        .route("/validate", post(handlers::validate_session))
        .route("/verify", post(handlers::verify_session))
        .route("/verify-email", post(handlers::verify_email))
        .route("/reset-password", post(handlers::reset_password))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/resend-verification", post(handlers::resend_verification))
        .with_state(state)
}
