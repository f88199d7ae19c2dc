use std::time::Duration;

use anyhow::Context;
use time::OffsetDateTime;

pub const DEFAULT_EXPIRES_IN: &str = "1h";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expires_in: &str) -> anyhow::Result<Self> {
        let secret = secret.into();
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");
        let ttl = parse_expires_in(expires_in)
            .with_context(|| format!("invalid JWT_EXPIRES_IN value {:?}", expires_in))?;
        let ttl_seconds = ttl.as_secs() as i64;
        // expiry timestamps must stay representable for every token issued from now on
        OffsetDateTime::now_utc()
            .checked_add(time::Duration::seconds(ttl_seconds))
            .with_context(|| {
                format!("JWT_EXPIRES_IN value {:?} is too far in the future", expires_in)
            })?;
        Ok(Self { secret, ttl_seconds })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://schoolhub.db?mode=rwc".into());
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let expires_in =
            std::env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| DEFAULT_EXPIRES_IN.into());
        let jwt = JwtConfig::new(secret, &expires_in)?;
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            Err(_) => 3000,
        };
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".into(),
                    "http://localhost:3000".into(),
                ]
            });
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            cors_origins,
            jwt,
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses token lifetimes written as `3600`, `90s`, `30m`, `1h` or `7d`.
pub fn parse_expires_in(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("missing amount in {:?}", raw))?;
    let scale: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => anyhow::bail!("unknown time unit {:?}", other),
    };
    let secs = amount
        .checked_mul(scale)
        .filter(|s| *s <= i64::MAX as u64)
        .context("token lifetime overflows")?;
    anyhow::ensure!(secs > 0, "token lifetime must be positive");
    Ok(Duration::from_secs(secs))
}
