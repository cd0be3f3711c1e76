//! # dj-config
//!
//! Layered settings: built-in defaults, then an optional `daybook.toml`, then
//! `DAYBOOK__SECTION__KEY` environment variables (a `.env` file is loaded first).

use std::net::SocketAddr;
use std::path::PathBuf;

use config::{Config, Environment, File};
use dj_core::StreakMode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "DAYBOOK";
pub const DEFAULT_FILE: &str = "daybook";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    /// Cookie that carries the session token for browser requests
    pub cookie_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsSettings {
    #[serde(default)]
    pub streak_mode: StreakMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    #[serde(default)]
    pub stats: StatsSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env`, `daybook.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_builder(
            base()?
                .add_source(File::with_name(DEFAULT_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).separator("__")),
        )
    }

    /// Loads defaults overlaid with a TOML document. Used by tests and tooling.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::from_builder(base()?.add_source(File::from_str(toml, config::FileFormat::Toml)))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be set (e.g. {ENV_PREFIX}__AUTH__JWT_SECRET)"
            )));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.cookie_name must not be empty".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("media.url_prefix must start with '/'".into()));
        }
        if self.media.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("media.max_upload_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address: {e}")))
    }
}

fn base() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite:daybook.db?mode=rwc")?
        .set_default("database.max_connections", 5)?
        .set_default("auth.jwt_secret", "")?
        .set_default("auth.cookie_name", "session")?
        .set_default("media.root", "./data/uploads")?
        .set_default("media.url_prefix", "/static/uploads")?
        .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
        .set_default("stats.streak_mode", "consecutive")?
        .set_default("log.format", "pretty")?)
}
