//! `dafilms` - DAFilms catalog client and stream resolver
//!
//! # Features
//!
//! - **Catalog**: newest/oldest/title listings, search, subscription and
//!   purchased films, JSON-LD film details
//! - **Login**: CSRF-protected form login with a cookie-backed session
//! - **Stream resolution**: layered extraction strategies over the film's
//!   player page, ranked by how directly each URL was found
//! - **Playback**: engine-aware candidate selection with fallback
//!
//! # Example
//!
//! ```rust,no_run
//! use dafilms::{FilmService, PlaybackEngine, Settings, SiteClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let client = SiteClient::new(&settings)?;
//!     let mut service = FilmService::new(client, settings);
//!     let item = service.play("10523", "Film", PlaybackEngine::default()).await?;
//!     println!("Playing {}", item.path);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http_client;
pub mod playback;
pub mod service;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::Session;
pub use catalog::{FilmDetails, FilmSummary, ListingSort};
pub use config::Settings;
pub use error::{DafilmsError, Result};
pub use http_client::{FetchedPage, PageFetcher, RequestKind, SiteClient};
pub use playback::{PlayItem, PlaybackEngine, PlaybackPlan};
pub use service::FilmService;
pub use stream::{
    Confidence, Diagnostic, ExtractionStrategy, Resolution, StreamCandidate, StreamFormat,
    StreamResolver,
};

/// Version of dafilms
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
