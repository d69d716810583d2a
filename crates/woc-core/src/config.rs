//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the backend URL, request timeout, team roster source and the
//! last email used to log in.
//!
//! Configuration is stored at `~/.config/woc/config.json`. The backend URL
//! can be overridden by `WOC_BACKEND_URL` (also read from `.env`) and by the
//! command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::transport::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "woc";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured backend
pub const BACKEND_URL_ENV: &str = "WOC_BACKEND_URL";

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Path or URL of `team.json`
    pub team_source: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Backend URL with precedence: command line, environment, file, default.
    /// A trailing slash is removed.
    pub fn backend_url(&self, cli_override: Option<&str>) -> String {
        let env = std::env::var(BACKEND_URL_ENV).ok();
        self.resolve_backend_url(cli_override, env.as_deref())
    }

    fn resolve_backend_url(&self, cli_override: Option<&str>, env: Option<&str>) -> String {
        cli_override
            .or(env)
            .or(self.backend_url.as_deref())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .trim()
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_precedence() {
        let config = Config {
            backend_url: Some("https://file.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_backend_url(Some("https://cli.example.com"), Some("https://env.example.com")),
            "https://cli.example.com"
        );
        assert_eq!(
            config.resolve_backend_url(None, Some("https://env.example.com")),
            "https://env.example.com"
        );
        assert_eq!(config.resolve_backend_url(None, None), "https://file.example.com");
        assert_eq!(Config::default().resolve_backend_url(None, None), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_request_timeout_default() {
        assert_eq!(Config::default().request_timeout(), Duration::from_secs(30));
        let config = Config {
            request_timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let config = Config {
            backend_url: Some("https://api.example.com".into()),
            last_email: Some("dev@example.com".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
