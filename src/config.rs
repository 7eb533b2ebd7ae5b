// src/config.rs
use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::EventId;
use crate::services::eventbrite::{Credentials, EventbriteClient, DEFAULT_API_HOST};
use crate::services::registrations::FailurePolicy;

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no credentials configured: set access_token, app_key + user_key, or app_key + user + password")]
    MissingCredentials,
    #[error("no event ids configured")]
    NoEvents,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub event_ids: Vec<EventId>,
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default)]
    pub user_key: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default)]
    pub on_fetch_failure: FailurePolicy,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

/// `COMPARE_SETTINGS` if set, otherwise `config/settings.json`.
pub fn settings_path() -> PathBuf {
    env::var("COMPARE_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        if settings.event_ids.is_empty() {
            return Err(ConfigError::NoEvents);
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading settings from {}", path.display());
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Settings::from_json(&json)
    }

    /// Settings file plus credential overrides from the environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut settings = Settings::load(&settings_path())?;
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(app_key) = non_empty("EVENTBRITE_APP_KEY") {
            debug!("app_key taken from environment");
            self.app_key = Some(app_key);
        }
        if let Some(user_key) = non_empty("EVENTBRITE_USER_KEY") {
            debug!("user_key taken from environment");
            self.user_key = Some(user_key);
        }
        if let Some(token) = non_empty("EVENTBRITE_ACCESS_TOKEN") {
            debug!("access_token taken from environment");
            self.access_token = Some(token);
        }
    }

    /// Access token wins, then app key + user key, then app key + password.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        if let Some(token) = present(&self.access_token) {
            return Ok(Credentials::AccessToken(token));
        }

        let app_key = present(&self.app_key).ok_or(ConfigError::MissingCredentials)?;
        if let Some(user_key) = present(&self.user_key) {
            return Ok(Credentials::UserKey { app_key, user_key });
        }

        match (present(&self.user), present(&self.password)) {
            (Some(user), Some(password)) => Ok(Credentials::Password {
                app_key,
                user,
                password,
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn client(&self) -> Result<EventbriteClient, ConfigError> {
        Ok(EventbriteClient::new(self.credentials()?).with_host(&self.api_host))
    }
}
