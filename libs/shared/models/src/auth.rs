use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Application role. `app_metadata.role` is server-controlled, so it wins
    /// over the top-level claim.
    pub fn application_role(&self) -> Option<String> {
        self.app_metadata
            .as_ref()
            .and_then(|meta| meta.get("role"))
            .and_then(|role| role.as_str())
            .map(str::to_string)
            .or_else(|| self.role.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(role: Option<&str>, app_metadata: Option<serde_json::Value>) -> JwtClaims {
        JwtClaims {
            sub: "user".to_string(),
            exp: None,
            email: None,
            role: role.map(str::to_string),
            app_metadata,
            user_metadata: None,
            aud: None,
            iat: None,
        }
    }

    #[test]
    fn test_app_metadata_role_takes_precedence() {
        let claims = claims(
            Some("authenticated"),
            Some(json!({ "role": "professional" })),
        );
        assert_eq!(claims.application_role().as_deref(), Some("professional"));
    }

    #[test]
    fn test_falls_back_to_top_level_role() {
        let claims = claims(Some("admin"), Some(json!({ "provider": "email" })));
        assert_eq!(claims.application_role().as_deref(), Some("admin"));
    }
}
