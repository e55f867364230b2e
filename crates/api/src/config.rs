//! Application configuration loaded from environment variables.

use std::time::Duration;

use payments::StripeConfig;
use secrecy::SecretString;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// A static bearer token and the email it signs in as.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: SecretString,
    pub email: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables (a `.env` file is loaded first by the
/// binary):
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL; orders are kept in memory when unset
/// - `STRIPE_SECRET_KEY`: enables Stripe; an in-memory provider is used when unset
/// - `CHECKOUT_SUCCESS_URL`, `CHECKOUT_CANCEL_URL`: provider redirect targets
/// - `CHECKOUT_CURRENCY`: ISO currency code (default: `usd`)
/// - `PROVIDER_TIMEOUT_SECS`: per-request provider timeout (default: `10`)
/// - `ADMIN_API_KEY`: enables the admin endpoints
/// - `AUTH_TOKENS`: `token=email` pairs separated by commas
/// - `CORS_ORIGINS`: allowed origins separated by commas (default: any)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<SecretString>,
    pub stripe_secret_key: Option<SecretString>,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub checkout_currency: String,
    pub provider_timeout: Duration,
    pub admin_api_key: Option<SecretString>,
    pub auth_tokens: Vec<AuthToken>,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match non_empty("LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => defaults.log_format,
            },
            database_url: non_empty("DATABASE_URL").map(SecretString::from),
            stripe_secret_key: non_empty("STRIPE_SECRET_KEY").map(SecretString::from),
            checkout_success_url: non_empty("CHECKOUT_SUCCESS_URL")
                .unwrap_or(defaults.checkout_success_url),
            checkout_cancel_url: non_empty("CHECKOUT_CANCEL_URL")
                .unwrap_or(defaults.checkout_cancel_url),
            checkout_currency: non_empty("CHECKOUT_CURRENCY")
                .map(|c| c.trim().to_ascii_lowercase())
                .unwrap_or(defaults.checkout_currency),
            provider_timeout: non_empty("PROVIDER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider_timeout),
            admin_api_key: non_empty("ADMIN_API_KEY").map(SecretString::from),
            auth_tokens: non_empty("AUTH_TOKENS")
                .map(|raw| parse_auth_tokens(&raw))
                .unwrap_or_default(),
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the Stripe settings when a secret key is configured.
    pub fn stripe_config(&self) -> Option<StripeConfig> {
        self.stripe_secret_key.clone().map(|secret_key| {
            let mut config = StripeConfig::new(secret_key);
            config.success_url = self.checkout_success_url.clone();
            config.cancel_url = self.checkout_cancel_url.clone();
            config.currency = self.checkout_currency.clone();
            config.timeout = self.provider_timeout;
            config
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            stripe_secret_key: None,
            checkout_success_url: "http://localhost:5173/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            checkout_cancel_url: "http://localhost:5173/cart".to_string(),
            checkout_currency: "usd".to_string(),
            provider_timeout: Duration::from_secs(10),
            admin_api_key: None,
            auth_tokens: Vec::new(),
            cors_origins: Vec::new(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// token=email pairs; malformed entries are skipped
fn parse_auth_tokens(raw: &str) -> Vec<AuthToken> {
    split_list(raw)
        .into_iter()
        .filter_map(|pair| {
            let (token, email) = pair.split_once('=')?;
            let (token, email) = (token.trim(), email.trim());
            if token.is_empty() || email.is_empty() {
                return None;
            }
            Some(AuthToken {
                token: SecretString::from(token.to_string()),
                email: email.to_string(),
            })
        })
        .collect()
}
