use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use chrono::NaiveDateTime;
use rocket::figment::Figment;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::notify::{NotifyConfig, SmtpConfig};

const DEV_SESSION_SECRET: &str = "sofia-session-secret";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub redis_url: String,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub admin_email: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
    pub invite_base_url: String,
    pub event_date: NaiveDateTime,
    pub static_dir: PathBuf,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, `std::env` in production.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = try_load(&var, "PORT", "3000")?;
        let session_secret = var("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, using the development secret");
            DEV_SESSION_SECRET.to_string()
        });
        let session_ttl_secs: u64 = try_load(&var, "SESSION_TTL_SECS", "86400")?;

        let smtp_user = var("SMTP_USER");
        let smtp = match (var("SMTP_HOST"), var("SMTP_PORT"), smtp_user.clone(), var("SMTP_PASS")) {
            (Some(host), Some(_), Some(user), Some(password)) => Some(SmtpConfig {
                host,
                port: try_load(&var, "SMTP_PORT", "587")?,
                user,
                password,
            }),
            _ => {
                warn!("SMTP configuration missing, emails will be logged instead of sent");
                None
            }
        };
        let from_email = var("FROM_EMAIL")
            .or(smtp_user)
            .unwrap_or_else(|| String::from("no-reply@example.com"));

        let event_name = var("EVENT_NAME").unwrap_or_else(|| String::from("Sofia's birthday"));

        Ok(Self {
            port,
            database_url: var("DATABASE_URL"),
            redis_url: load_or(&var, "REDIS_URL", "redis://127.0.0.1:6379"),
            session_secret,
            session_ttl: Duration::from_secs(session_ttl_secs),
            admin_email: load_or(&var, "ADMIN_EMAIL", "admin@sofia.local"),
            admin_password: load_or(&var, "ADMIN_PASSWORD", "changeme"),
            bcrypt_cost: try_load(&var, "BCRYPT_COST", "10")?,
            invite_base_url: var("INVITE_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{port}"))
                .trim_end_matches('/')
                .to_string(),
            event_date: try_load(&var, "EVENT_DATE", "2025-12-06T14:00:00")?,
            static_dir: PathBuf::from(load_or(&var, "STATIC_DIR", "static")),
            notify: NotifyConfig {
                organizer_email: load_or(&var, "ORGANIZER_EMAIL", "organizer@example.com"),
                organizer_whatsapp: load_or(&var, "ORGANIZER_WHATSAPP", "21678405898"),
                event_name,
                from_email,
                smtp,
            },
        })
    }

    /// Rocket settings derived from this config, on top of Rocket's defaults.
    pub fn figment(&self) -> Figment {
        let mut figment = rocket::Config::figment()
            .merge(("address", "0.0.0.0"))
            .merge(("port", self.port))
            .merge(("secret_key", secret_key_hex(&self.session_secret)))
            .merge(("databases.sessions.url", self.redis_url.as_str()));
        if let Some(url) = &self.database_url {
            figment = figment.merge(("databases.guests.url", url.as_str()));
        }
        figment
    }

    pub fn invite_url(&self, token: &str) -> String {
        format!("{}/invite/{token}", self.invite_base_url)
    }
}

/// Rocket wants exactly 256 or 512 bits; any passphrase is hashed down to 256.
fn secret_key_hex(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

fn load_or<F>(var: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<F, T>(var: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = load_or(var, key, default);
    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }
    })
}
