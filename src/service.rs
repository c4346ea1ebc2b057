//! High-level film operations over a [`PageFetcher`].
//!
//! Ties the catalog parsers, the login session and the stream resolver
//! together: one method per user action, each a single blocking round of
//! requests.

use tracing::{info, instrument, warn};

use crate::auth::Session;
use crate::catalog::{
    self, film_url, parse_film_cards, parse_film_details, parse_purchased_films, player_url,
    FilmDetails, FilmSummary, ListingSort,
};
use crate::config::Settings;
use crate::error::{DafilmsError, Result};
use crate::http_client::{PageFetcher, RequestKind};
use crate::playback::{PlayItem, PlaybackEngine, PlaybackPlan};
use crate::stream::{Diagnostic, Resolution, StreamResolver};

pub struct FilmService<F: PageFetcher> {
    fetcher: F,
    settings: Settings,
    session: Session,
    resolver: StreamResolver,
}

impl<F: PageFetcher> FilmService<F> {
    pub fn new(fetcher: F, settings: Settings) -> Self {
        Self {
            fetcher,
            settings,
            session: Session::new(),
            resolver: StreamResolver::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Log in with the configured credentials.
    pub async fn login(&mut self) -> Result<()> {
        self.session.ensure_logged_in(&self.fetcher, &self.settings).await
    }

    /// Log in when credentials exist; anonymous browsing otherwise.
    async fn try_login(&mut self) {
        if self.settings.credentials().is_none() {
            return;
        }
        if let Err(e) = self.login().await {
            warn!(error = %e, "Continuing without login");
        }
    }

    /// Catalog listing in the given order.
    pub async fn list(&mut self, sort: ListingSort, limit: Option<usize>) -> Result<Vec<FilmSummary>> {
        self.try_login().await;
        let limit = limit.unwrap_or(self.settings.listing_limit);
        self.fetch_cards(&sort.url(&self.settings), limit).await
    }

    /// Films included in the subscription.
    pub async fn subscription(&mut self, limit: Option<usize>) -> Result<Vec<FilmSummary>> {
        self.try_login().await;
        let limit = limit.unwrap_or(self.settings.subscription_limit);
        let url = self.settings.url(catalog::SUBSCRIPTION_COLLECTION);
        self.fetch_cards(&url, limit).await
    }

    /// Films bought by the logged-in user.
    pub async fn purchased(&mut self) -> Result<Vec<FilmSummary>> {
        self.login().await?;
        let url = self.settings.url(catalog::PAYMENTS_PAGE);
        let page = self.fetcher.get_ok(&url, RequestKind::Document).await?;
        parse_purchased_films(&page.body, &self.settings)
    }

    /// Full-text search. A blank query returns nothing without a request.
    pub async fn search(&mut self, query: &str, limit: Option<usize>) -> Result<Vec<FilmSummary>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.unwrap_or(self.settings.search_limit);
        let url = catalog::search_url(&self.settings, query);
        self.fetch_cards(&url, limit).await
    }

    pub async fn details(&mut self, film_id: &str) -> Result<FilmDetails> {
        let url = film_url(&self.settings, film_id);
        let page = self.fetcher.get_ok(&url, RequestKind::Document).await?;
        parse_film_details(&page.body)
    }

    /// Fetch the film's player endpoint and resolve stream candidates.
    ///
    /// Requires login. HTTP 403 means the film must be bought first. An empty
    /// resolution is not an error here; its diagnostic is logged and, with
    /// `diagnostics_dir` set, the raw page is dumped.
    #[instrument(skip(self))]
    pub async fn resolve_film(&mut self, film_id: &str) -> Result<Resolution> {
        self.login().await?;

        let url = player_url(&self.settings, film_id);
        let referer = film_url(&self.settings, film_id);
        let page = self.fetcher.get(&url, RequestKind::Xhr { referer }).await?;

        if page.status == reqwest::StatusCode::FORBIDDEN {
            return Err(DafilmsError::AccessDenied {
                film_id: film_id.to_string(),
            });
        }
        let page = page.error_for_status()?;

        let resolution = self.resolver.resolve_player_response(&page.body, Some(url.as_str()));

        if resolution.is_empty() {
            if let Some(dir) = &self.settings.diagnostics_dir {
                match Diagnostic::write_to(dir, film_id, &page.body) {
                    Ok(path) => info!(path = %path.display(), "Dumped player page"),
                    Err(e) => warn!(error = %e, "Could not dump player page"),
                }
            }
        }
        Ok(resolution)
    }

    /// Resolve, select and describe the stream to play.
    pub async fn play(&mut self, film_id: &str, title: &str, engine: PlaybackEngine) -> Result<PlayItem> {
        let candidates = self.resolve_film(film_id).await?.into_candidates(film_id)?;
        let plan = PlaybackPlan::new(film_id, candidates, engine, self.settings.prefer_hd);
        let user_agent = self.settings.user_agent.clone();
        plan.play_with(|candidate| {
            let lower = candidate.url.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                Ok(PlayItem::for_candidate(title, candidate, &user_agent))
            } else {
                Err(DafilmsError::Parse(format!("not an http(s) URL: {}", candidate.url)))
            }
        })
    }

    async fn fetch_cards(&self, url: &str, limit: usize) -> Result<Vec<FilmSummary>> {
        let page = self.fetcher.get_ok(url, RequestKind::Document).await?;
        parse_film_cards(&page.body, &self.settings, limit)
    }
}
