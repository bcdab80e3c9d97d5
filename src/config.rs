use chrono::NaiveTime;
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::auth::token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound for token lifetimes: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Outgoing mail settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    /// Falls back to `jwt_secret` when `JWT_REFRESH_SECRET` is unset.
    pub jwt_refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// UTC time of day the reminder job runs.
    pub reminder_time: NaiveTime,
    pub smtp: Option<SmtpConfig>,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// A token lifetime in seconds, between one second and `MAX_TOKEN_TTL_SECS`.
fn token_ttl(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    let secs = parsed(key, default)?;
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            key,
            value: secs.to_string(),
        });
    }
    Ok(secs)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        let reminder_time = match optional("REMINDER_TIME") {
            Some(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
                ConfigError::Invalid {
                    key: "REMINDER_TIME",
                    value,
                }
            })?,
            None => NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        };

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
                from: optional("SMTP_FROM")
                    .unwrap_or_else(|| "No Reply <noreply@example.com>".to_string()),
                tls: parsed("SMTP_TLS", true)?,
            }),
            None => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port: parsed("SERVER_PORT", 8080)?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_refresh_secret: optional("JWT_REFRESH_SECRET").unwrap_or_else(|| jwt_secret.clone()),
            jwt_secret,
            access_token_ttl_secs: token_ttl("ACCESS_TOKEN_TTL_SECS", ACCESS_TOKEN_TTL_SECS)?,
            refresh_token_ttl_secs: token_ttl("REFRESH_TOKEN_TTL_SECS", REFRESH_TOKEN_TTL_SECS)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            upload_dir: PathBuf::from(
                optional("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()),
            ),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            reminder_time,
            smtp,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
