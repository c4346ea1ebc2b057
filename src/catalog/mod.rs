//! Film catalog: listings, search, purchases and film details.
//!
//! Listing pages, search results and the subscription collection all render
//! the same film-card markup, so one parser serves them all.

pub mod details;
pub mod listing;

pub use details::{parse_film_details, FilmDetails};
pub use listing::{parse_film_cards, parse_purchased_films};

use serde::Serialize;

use crate::config::Settings;

/// Path of the subscription (SVOD) collection.
pub const SUBSCRIPTION_COLLECTION: &str = "/collection/35-svod-covered";
/// Path of the user's payment history.
pub const PAYMENTS_PAGE: &str = "/user/detail/payments";

/// A film as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilmSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub detail_url: String,
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSort {
    /// Most recently added first.
    Newest,
    /// Least recently added first.
    Oldest,
    Title { ascending: bool },
    /// Site default order.
    All,
}

impl ListingSort {
    /// Catalog URL for this ordering. `o=r` orders by addition time, `o=t`
    /// by title, `oa` selects the direction.
    pub fn url(self, settings: &Settings) -> String {
        let query = match self {
            Self::Newest => "?o=r&oa=1",
            Self::Oldest => "?o=r&oa=0",
            Self::Title { ascending: true } => "?o=t&oa=1",
            Self::Title { ascending: false } => "?o=t&oa=0",
            Self::All => "",
        };
        settings.url(&format!("/film{query}"))
    }
}

/// Search URL for `query`.
pub fn search_url(settings: &Settings, query: &str) -> String {
    settings.url(&format!("/film?q={}", urlencoding::encode(query.trim())))
}

/// Film detail page URL.
pub fn film_url(settings: &Settings, film_id: &str) -> String {
    settings.url(&format!("/film/{film_id}"))
}

/// Player endpoint URL.
pub fn player_url(settings: &Settings, film_id: &str) -> String {
    settings.url(&format!("/film/{film_id}/player"))
}

/// Film id from a detail URL: the path segment after `/film/`.
pub fn film_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/film/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Make a site-relative href absolute.
pub(crate) fn absolutize(settings: &Settings, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        settings.url(href)
    } else {
        settings.url(&format!("/{href}"))
    }
}
