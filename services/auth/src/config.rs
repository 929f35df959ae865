use std::num::NonZeroU64;
use std::str::FromStr;

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "bookly.app").
    pub cookie_domain: String,
    /// Secure cookie attribute (default true). Env var: `COOKIE_SECURE`.
    pub cookie_secure: bool,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    /// Resend API key. Codes are only logged when unset.
    pub resend_api_key: Option<String>,
    /// Sender address for verification emails. Env var: `EMAIL_FROM`.
    pub email_from: String,
    /// Zero is rejected and falls back to the default, like any unparsable value.
    pub otp_rate_limit_window_secs: NonZeroU64,
    pub otp_rate_limit_max: u64,
    pub outbox_poll_interval_ms: NonZeroU64,
}

const DEFAULT_RATE_WINDOW_SECS: NonZeroU64 = NonZeroU64::new(30).unwrap();
const DEFAULT_POLL_INTERVAL_MS: NonZeroU64 = NonZeroU64::new(1000).unwrap();

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            cookie_secure: env_or("COOKIE_SECURE", true),
            auth_port: env_or("AUTH_PORT", 3112),
            resend_api_key: std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Bookly <onboarding@resend.dev>".to_owned()),
            otp_rate_limit_window_secs: env_or(
                "OTP_RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_WINDOW_SECS,
            ),
            otp_rate_limit_max: env_or("OTP_RATE_LIMIT_MAX", 10),
            outbox_poll_interval_ms: env_or(
                "OUTBOX_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            ),
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}
