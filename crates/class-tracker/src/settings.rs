//! Process settings, read once at startup.
//!
//! Sources in increasing precedence: built-in defaults, an optional
//! `config.toml`, then `CLASSTRACK_`-prefixed environment variables with
//! `__` between sections (e.g. `CLASSTRACK_SERVER__PORT=8080`). A `.env`
//! file is loaded into the environment first.

use chrono_tz::Tz;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::schedule::{tz, ScheduleError};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub canvas: CanvasSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `class_tracker=debug`
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Zone used when the stored configuration does not name one
    pub default_timezone: String,
}

impl ScheduleConfig {
    pub fn fallback_zone(&self) -> Result<Tz, ScheduleError> {
        tz::parse_zone(&self.default_timezone)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Server-side Canvas credentials for `POST /api/sync/canvas`.
#[derive(Clone, Default, Deserialize)]
pub struct CanvasSettings {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

impl CanvasSettings {
    /// Both values, when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let base = self.base_url.as_deref().filter(|s| !s.trim().is_empty())?;
        let token = self.access_token.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((base, token))
    }
}

impl fmt::Debug for CanvasSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasSettings")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 4000)?
        .set_default("logging.level", "info")?
        .set_default("schedule.default_timezone", "America/New_York")?
        .set_default("storage.data_dir", "data")
}

impl Settings {
    /// Loads settings from `.env`, `config.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        with_defaults()?
            .add_source(File::with_name("config.toml").required(false))
            .add_source(
                Environment::with_prefix("CLASSTRACK")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Settings built from the defaults alone.
    pub fn defaults() -> Result<Self, ConfigError> {
        with_defaults()?.build()?.try_deserialize()
    }
}
