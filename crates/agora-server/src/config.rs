use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use agora_api::auth::ApiConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const MAX_SESSION_DAYS: i64 = 365;
const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Account promoted to admin at startup, if set.
    pub admin_email: Option<String>,
    pub api: ApiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("AGORA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("AGORA_JWT_SECRET is unset or still a placeholder. Set it in your .env file and restart.");
        }

        let mut api = ApiConfig::new(jwt_secret);
        if let Some(days) = get("AGORA_SESSION_DAYS") {
            api.session_days = bounded("AGORA_SESSION_DAYS", &days, MAX_SESSION_DAYS)?;
        }
        if let Some(minutes) = get("AGORA_TOKEN_TTL_MINUTES") {
            api.token_ttl_minutes = bounded("AGORA_TOKEN_TTL_MINUTES", &minutes, MAX_TOKEN_TTL_MINUTES)?;
        }
        if let Some(url) = get("AGORA_PUBLIC_URL") {
            api.public_url = url;
        }
        if let Some(words) = get("AGORA_BLOCKED_WORDS") {
            api.blocked_words = words
                .split(',')
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect();
        }

        Ok(Self {
            host: get("AGORA_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: get("AGORA_PORT")
                .unwrap_or_else(|| "3005".into())
                .parse()
                .context("AGORA_PORT must be a port number")?,
            db_path: get("AGORA_DB_PATH").unwrap_or_else(|| "agora.db".into()).into(),
            admin_email: get("AGORA_ADMIN_EMAIL").filter(|e| !e.trim().is_empty()),
            api,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Parse a lifetime in `1..=max`.
fn bounded(key: &str, value: &str, max: i64) -> Result<i64> {
    let n: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number"))?;
    if !(1..=max).contains(&n) {
        bail!("{key} must be between 1 and {max}, got {n}");
    }
    Ok(n)
}
