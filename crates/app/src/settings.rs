//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden by `EXPENSE_BOT__*` environment
//! variables, e.g. `EXPENSE_BOT__TELEGRAM__OWNER_ID`.
//!
//! See `settings.example.toml` for the configuration.
use std::{env, fs, path::PathBuf};

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use ledger::BackendSettings;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";
const ENV_PREFIX: &str = "EXPENSE_BOT";
const TOKEN_ENV: &str = "BOT_TOKEN";
const TOKEN_FILE: &str = "bot.token";
const DEFAULT_SESSION_FILE: &str = "sessions.json";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    token: Option<String>,
    pub owner_id: u64,
    #[serde(default = "default_timezone")]
    timezone: String,
    /// Descriptions recorded as earnings.
    pub income_descriptions: Option<Vec<String>>,
    /// Conversations kept between `handle-update` runs.
    session_file: Option<PathBuf>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Telegram {
    /// Bot token from the settings, else `BOT_TOKEN`, else the `bot.token` file.
    pub fn token(&self) -> Result<String, ConfigError> {
        if let Some(token) = self.token.as_deref().map(str::trim)
            && !token.is_empty()
        {
            return Ok(token.to_string());
        }
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }
        fs::read_to_string(TOKEN_FILE)
            .map(|token| token.trim().to_string())
            .map_err(|err| {
                ConfigError::Message(format!(
                    "telegram token not configured ({TOKEN_ENV} unset, {TOKEN_FILE}: {err})"
                ))
            })
    }

    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|err| {
            ConfigError::Message(format!("invalid timezone '{}': {err}", self.timezone))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub telegram: Telegram,
    #[serde(default)]
    pub repository: BackendSettings,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some()),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
