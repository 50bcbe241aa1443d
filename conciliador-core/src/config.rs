//! Configuration management
//!
//! `settings.json` in the data directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8000", "timeoutSeconds": 30 },
//!   "auth": { "tokenTtlMinutes": 30 }
//! }
//! ```
//! Keys this crate does not know about are kept when saving.
//! `CONCILIADOR_API_URL` overrides the base URL at load time.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::adapters::auth::DEFAULT_TOKEN_TTL_MINUTES;
use crate::domain::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const API_URL_ENV: &str = "CONCILIADOR_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_seconds: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_ttl_minutes: Option<i64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub token_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

/// Check `raw` is an http(s) URL and drop trailing slashes
pub fn normalize_base_url(raw: &str) -> std::result::Result<String, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed =
        Url::parse(trimmed).map_err(|e| Error::Config(format!("invalid API URL '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(Error::Config(format!(
            "API URL must use http or https, got '{}'",
            other
        ))),
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

impl Config {
    /// Load from `settings.json` in `data_dir`, then apply the env override
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_override(data_dir, std::env::var(API_URL_ENV).ok())
    }

    /// Like [`load`](Self::load) with the base URL override passed in
    pub fn load_with_override(data_dir: &Path, api_url: Option<String>) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let defaults = Self::default();

        let base_url = match api_url.filter(|v| !v.trim().is_empty()) {
            Some(url) => url,
            None => raw.api.base_url.clone().unwrap_or(defaults.base_url),
        };

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout_seconds: raw
                .api
                .timeout_seconds
                .filter(|t| *t > 0)
                .unwrap_or(defaults.timeout_seconds),
            token_ttl_minutes: raw
                .auth
                .token_ttl_minutes
                .filter(|t| *t > 0)
                .unwrap_or(defaults.token_ttl_minutes),
        })
    }

    /// Write the managed keys back, keeping everything else in the file
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let mut settings = read_settings(data_dir)?;
        settings.api.base_url = Some(normalize_base_url(&self.base_url)?);
        settings.api.timeout_seconds = Some(self.timeout_seconds);
        settings.auth.token_ttl_minutes = Some(self.token_ttl_minutes);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Set one key by its dotted name (`api.baseUrl`, `api.timeoutSeconds`,
    /// `auth.tokenTtlMinutes`)
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), Error> {
        let positive = |value: &str| -> std::result::Result<u64, Error> {
            value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| Error::Config(format!("'{}' expects a positive number", key)))
        };

        match key {
            "api.baseUrl" => self.base_url = normalize_base_url(value)?,
            "api.timeoutSeconds" => self.timeout_seconds = positive(value)?,
            "auth.tokenTtlMinutes" => self.token_ttl_minutes = positive(value)? as i64,
            other => return Err(Error::Config(format!("unknown setting '{}'", other))),
        }
        Ok(())
    }
}
