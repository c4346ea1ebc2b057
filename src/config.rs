//! Settings loaded from `~/.config/dafilms/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DafilmsError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dafilms.cz";
pub const DEFAULT_USER_AGENT: &str = "Kodi/DAFilms Addon";
pub const DEFAULT_BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:146.0) Gecko/20100101 Firefox/146.0";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "cs,sk;q=0.8,en-US;q=0.5,en;q=0.3";

/// Runtime settings. Every field may be omitted from the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site root, without trailing slash.
    pub base_url: String,
    /// User-Agent for plain catalog requests and stream headers.
    pub user_agent: String,
    /// User-Agent for player and login requests, which the site only serves to browsers.
    pub browser_user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub listing_limit: usize,
    pub search_limit: usize,
    pub subscription_limit: usize,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Raw player pages are dumped here when no stream can be resolved.
    pub diagnostics_dir: Option<PathBuf>,
    /// Prefer the highest resolution among equally ranked candidates.
    pub prefer_hd: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            listing_limit: 20,
            search_limit: 20,
            subscription_limit: 50,
            username: None,
            password: None,
            diagnostics_dir: None,
            prefer_hd: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults. Credentials from
    /// `DAFILMS_USERNAME` / `DAFILMS_PASSWORD` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(config_path, Path::to_path_buf);
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                DafilmsError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            Self::from_toml(&content)?
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Self::default()
        };

        settings.apply_env(
            std::env::var("DAFILMS_USERNAME").ok(),
            std::env::var("DAFILMS_PASSWORD").ok(),
        );
        Ok(settings)
    }

    /// Parse settings from TOML text and validate them.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(content)?;
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env(&mut self, username: Option<String>, password: Option<String>) {
        if let Some(user) = username.filter(|u| !u.is_empty()) {
            self.username = Some(user);
        }
        if let Some(pass) = password.filter(|p| !p.is_empty()) {
            self.password = Some(pass);
        }
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| DafilmsError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if self.timeout_secs == 0 {
            return Err(DafilmsError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Credentials, when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Absolute URL for a site path such as `/film/123`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Return the path to the settings file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dafilms")
        .join("config.toml")
}
