//! Error taxonomy for fetching, parsing and resolving DAFilms content.
//!
//! Parse failures are recovered at the strategy level and only ever logged;
//! transport failures and total resolution failure reach the caller, which
//! turns them into a short user-visible message via
//! [`DafilmsError::user_message`].

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the library.
#[derive(Error, Debug)]
pub enum DafilmsError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("film {film_id} requires purchase or subscription")]
    AccessDenied { film_id: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no playable stream found for film {film_id}")]
    NoStreamFound { film_id: String },

    #[error("login required: no credentials configured")]
    LoginRequired,

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DafilmsError>;

impl DafilmsError {
    /// Wrap a reqwest error together with the URL that was requested.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Short message suitable for a notification banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::HttpStatus { .. } => "Content unavailable",
            Self::AccessDenied { .. } => "Film requires purchase or subscription",
            Self::NoStreamFound { .. } => "Playback unavailable",
            Self::LoginRequired => "Login required: set credentials in settings",
            Self::LoginFailed(_) => "Login failed: check your credentials",
            Self::Parse(_) | Self::Json(_) => "Unexpected page content",
            Self::Config(_) | Self::Toml(_) | Self::Io(_) => "Invalid configuration",
        }
    }

    /// `true` for network and HTTP-status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}
