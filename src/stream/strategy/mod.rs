//! Extraction strategies.
//!
//! Each [`ExtractionStrategy`] scans a page one way and reports the
//! candidates it found. The resolver always runs the primary strategies and
//! consults fallbacks only when the primaries found nothing.
//!
//! | Strategy | Confidence | Fallback |
//! |---|---|---|
//! | [`SourceTagStrategy`] | `Direct` | no |
//! | [`PlayerConfigStrategy`] | `Script` | no |
//! | [`UrlPatternStrategy`] | `Pattern` | yes |
//! | [`HeuristicStrategy`] | `Heuristic` | yes |

pub mod heuristic;
pub mod player_config;
pub mod source_tag;
pub mod url_pattern;

pub use heuristic::HeuristicStrategy;
pub use player_config::PlayerConfigStrategy;
pub use source_tag::SourceTagStrategy;
pub use url_pattern::UrlPatternStrategy;

use url::Url;

use super::candidate::{normalize_url, Confidence, StreamCandidate};
use super::page::PageDocument;
use crate::error::Result;

/// What a strategy gets to look at.
pub struct PageContext<'a> {
    pub document: &'a PageDocument,
    pub raw: &'a str,
    /// Page URL for resolving relative sources.
    pub base_url: Option<&'a Url>,
}

impl PageContext<'_> {
    /// Resolve a raw attribute or JSON value to an absolute http(s) URL.
    pub fn absolute_url(&self, raw: &str) -> Option<String> {
        absolute_url(raw, self.base_url)
    }
}

/// One way of finding stream URLs in a page.
pub trait ExtractionStrategy: Send + Sync {
    /// Short lowercase name used in logs and candidate records.
    fn name(&self) -> &'static str;

    /// Confidence assigned to everything this strategy finds.
    fn confidence(&self) -> Confidence;

    /// Fallback strategies run only when no primary strategy found anything.
    fn is_fallback(&self) -> bool {
        false
    }

    /// Scan the page. `Ok(vec![])` means "nothing here"; `Err` is a soft
    /// failure that the resolver logs before moving on.
    fn extract(&self, page: &PageContext<'_>) -> Result<Vec<StreamCandidate>>;
}

/// The default pipeline, in priority order.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(SourceTagStrategy),
        Box::new(PlayerConfigStrategy::new()),
        Box::new(UrlPatternStrategy::new()),
        Box::new(HeuristicStrategy),
    ]
}

const NON_MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".vtt", ".srt", ".css", ".js",
    ".json", ".html", ".woff", ".woff2",
];

/// `true` when the URL path ends in an image, subtitle or page-asset extension.
pub fn is_non_media(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    NON_MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Resolve `raw` to an absolute http(s) URL, joining relative paths onto `base`.
pub fn absolute_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let cleaned = normalize_url(raw);
    if cleaned.is_empty() {
        return None;
    }
    let lower = cleaned.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(cleaned);
    }
    if let Some(rest) = cleaned.strip_prefix("//") {
        let scheme = base.map_or("https", Url::scheme);
        return Some(format!("{scheme}://{rest}"));
    }
    if lower.starts_with("blob:") || lower.starts_with("data:") || lower.starts_with("javascript:") {
        return None;
    }
    let joined = base?.join(&cleaned).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}
