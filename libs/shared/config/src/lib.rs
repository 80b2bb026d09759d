use std::env;
use tracing::warn;

const DEFAULT_EMAIL_FROM: &str = "Carebook <noreply@carebook.app>";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_VERIFY_TOKEN_TTL_MINUTES: i64 = 24 * 60;
const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub resend_api_key: String,
    pub email_from: String,
    pub app_base_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub verify_token_ttl_minutes: i64,
    pub reset_token_ttl_minutes: i64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            resend_api_key: String::new(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
            verify_token_ttl_minutes: DEFAULT_VERIFY_TOKEN_TTL_MINUTES,
            reset_token_ttl_minutes: DEFAULT_RESET_TOKEN_TTL_MINUTES,
            port: DEFAULT_PORT,
        }
    }
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn with_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default", name);
        default.to_string()
    })
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number, using default", name);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required("SUPABASE_URL"),
            supabase_anon_key: required("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_service_role_key: required("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET"),
            resend_api_key: required("RESEND_API_KEY"),
            email_from: with_default("EMAIL_FROM", DEFAULT_EMAIL_FROM),
            app_base_url: with_default("APP_BASE_URL", DEFAULT_APP_BASE_URL),
            google_client_id: required("GOOGLE_CLIENT_ID"),
            google_client_secret: required("GOOGLE_CLIENT_SECRET"),
            verify_token_ttl_minutes: parsed_or(
                "VERIFY_TOKEN_TTL_MINUTES",
                DEFAULT_VERIFY_TOKEN_TTL_MINUTES,
            ),
            reset_token_ttl_minutes: parsed_or(
                "RESET_TOKEN_TTL_MINUTES",
                DEFAULT_RESET_TOKEN_TTL_MINUTES,
            ),
            port: parsed_or("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_role_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.resend_api_key.is_empty() && !self.email_from.is_empty()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.google_client_id.is_empty() && !self.google_client_secret.is_empty()
    }

    /// Key used by server-side stores. Falls back to the anon key so local
    /// setups without a service role still reach PostgREST.
    pub fn database_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}
