//! Stream resolution pipeline.
//!
//! Runs every primary strategy over the page, merges their candidates,
//! consults the fallbacks only when the primaries came back empty, then
//! dedups and ranks. An empty result carries a [`Diagnostic`] instead of an
//! error: resolution itself never fails.

use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::candidate::StreamCandidate;
use super::diagnostic::Diagnostic;
use super::page::PageDocument;
use super::player::unwrap_player_response;
use super::strategy::{default_strategies, ExtractionStrategy, PageContext};
use crate::error::{DafilmsError, Result};

/// Outcome of one resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Highest-ranked first, deduplicated by URL.
    pub candidates: Vec<StreamCandidate>,
    /// Present only when `candidates` is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
    /// Soft failures reported by strategies, as `"strategy: message"`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub soft_failures: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn best(&self) -> Option<&StreamCandidate> {
        self.candidates.first()
    }

    /// Candidates, or [`DafilmsError::NoStreamFound`] when there are none.
    pub fn into_candidates(self, film_id: &str) -> Result<Vec<StreamCandidate>> {
        if self.candidates.is_empty() {
            Err(DafilmsError::NoStreamFound {
                film_id: film_id.to_string(),
            })
        } else {
            Ok(self.candidates)
        }
    }
}

/// Ordered set of extraction strategies.
pub struct StreamResolver {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StreamResolver {
    /// Resolver with the default pipeline.
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    /// Resolver with a custom pipeline, run in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve stream candidates from page text.
    ///
    /// `page_url` is used to absolutise relative sources and is recorded in
    /// the diagnostic. An unparseable `page_url` is ignored.
    #[instrument(skip(self, html), fields(bytes = html.len()))]
    pub fn resolve(&self, html: &str, page_url: Option<&str>) -> Resolution {
        let document = PageDocument::parse(html);
        let base = page_url.and_then(|u| Url::parse(u).ok());
        let page = PageContext {
            document: &document,
            raw: html,
            base_url: base.as_ref(),
        };

        let mut soft_failures = Vec::new();
        let primaries = self.strategies.iter().filter(|s| !s.is_fallback());
        let mut found = run_strategies(primaries, &page, &mut soft_failures);

        if found.is_empty() {
            debug!("Primary strategies found nothing, consulting fallbacks");
            let fallbacks = self.strategies.iter().filter(|s| s.is_fallback());
            found = run_strategies(fallbacks, &page, &mut soft_failures);
        }

        let candidates = rank(dedup(found));
        let diagnostic = if candidates.is_empty() {
            let diagnostic = Diagnostic::capture(html, page_url, &document);
            warn!(
                bytes = diagnostic.byte_len,
                mentions_video = diagnostic.mentions_video(),
                "No stream candidates found"
            );
            Some(diagnostic)
        } else {
            debug!(count = candidates.len(), best = %candidates[0].url, "Resolved candidates");
            None
        };

        Resolution {
            candidates,
            diagnostic,
            soft_failures,
        }
    }

    /// Resolve a raw player endpoint response: a JSON snippet envelope, a
    /// bare player config, or plain HTML.
    pub fn resolve_player_response(&self, body: &str, page_url: Option<&str>) -> Resolution {
        self.resolve(&unwrap_player_response(body), page_url)
    }
}

impl Default for StreamResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn run_strategies<'s>(
    strategies: impl Iterator<Item = &'s Box<dyn ExtractionStrategy>>,
    page: &PageContext<'_>,
    soft_failures: &mut Vec<String>,
) -> Vec<StreamCandidate> {
    let mut found = Vec::new();
    for strategy in strategies {
        match strategy.extract(page) {
            Ok(candidates) => {
                debug!(strategy = strategy.name(), count = candidates.len(), "Strategy finished");
                found.extend(candidates);
            }
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Strategy failed, continuing");
                soft_failures.push(format!("{}: {e}", strategy.name()));
            }
        }
    }
    found
}

/// Collapse repeated URLs, keeping the first position and the highest
/// confidence seen for it, and filling a missing format, label or quality
/// from later hits.
fn dedup(found: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    let mut merged: Vec<StreamCandidate> = Vec::with_capacity(found.len());
    for candidate in found {
        if let Some(existing) = merged.iter_mut().find(|c| c.url == candidate.url) {
            if candidate.confidence > existing.confidence {
                existing.confidence = candidate.confidence;
                existing.strategy = candidate.strategy;
            }
            if !existing.format.is_known() {
                existing.format = candidate.format;
            }
            if existing.label.is_none() {
                existing.label = candidate.label;
            }
            if existing.quality.is_none() {
                existing.quality = candidate.quality;
            }
        } else {
            merged.push(candidate);
        }
    }
    merged
}

/// Stable sort: equal-ranked candidates keep discovery order (first found wins).
fn rank(mut candidates: Vec<StreamCandidate>) -> Vec<StreamCandidate> {
    candidates.sort_by(StreamCandidate::rank_cmp);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::candidate::{Confidence, StreamFormat};

    #[test]
    fn player_response_envelope() {
        let body = r##"{"snippets":{"#film-player-container":"<video src=\"https://cdn.example/f.mp4\"></video>"}}"##;
        let res = StreamResolver::new().resolve_player_response(body, None);
        assert_eq!(res.best().map(|c| c.url.as_str()), Some("https://cdn.example/f.mp4"));

        let empty = StreamResolver::new().resolve_player_response("<p>nothing</p>", None);
        assert!(empty.is_empty());
        assert!(empty.diagnostic.is_some());
    }

    #[test]
    fn duplicate_fills_missing_format() {
        let res = StreamResolver::new().resolve(
            r#"<video><source src="https://cdn.example/play?id=1"></video>
               <script>playerConfig = {"sources":[{"src":"https://cdn.example/play?id=1","type":"application/x-mpegURL","label":"HD"}]};</script>"#,
            None,
        );
        assert_eq!(res.candidates.len(), 1);
        let c = &res.candidates[0];
        assert_eq!(c.format, StreamFormat::Hls);
        assert_eq!(c.confidence, Confidence::Direct);
        assert_eq!(c.strategy, "source-tag");
        assert_eq!(c.label.as_deref(), Some("HD"));
    }

    #[test]
    fn direct_tag_example() {
        let res = StreamResolver::new().resolve(
            r#"<source src="https://cdn.example/video.mp4" type="video/mp4">"#,
            None,
        );
        assert_eq!(res.candidates.len(), 1);
        let c = &res.candidates[0];
        assert_eq!(c.url, "https://cdn.example/video.mp4");
        assert_eq!(c.format, StreamFormat::Mp4);
        assert_eq!(c.confidence, Confidence::Direct);
        assert!(res.diagnostic.is_none());
    }

    #[test]
    fn player_config_example() {
        let res = StreamResolver::new().resolve(
            r#"<script>playerConfig = {"sources":[{"src":"https://cdn.example/stream.m3u8"}]};</script>"#,
            None,
        );
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].url, "https://cdn.example/stream.m3u8");
        assert_eq!(res.candidates[0].format, StreamFormat::Hls);
        assert_eq!(res.candidates[0].confidence, Confidence::Script);
    }

    #[test]
    fn empty_page_gives_diagnostic() {
        let res = StreamResolver::new().resolve("", None);
        assert!(res.is_empty());
        assert!(res.diagnostic.is_some());
        assert!(matches!(
            res.into_candidates("5"),
            Err(DafilmsError::NoStreamFound { film_id }) if film_id == "5"
        ));
    }

    #[test]
    fn fallbacks_skipped_when_primary_hits() {
        let html = r#"<video><source src="https://cdn/a.mp4"></video>
                      <p>Trailer: https://other.example/trailer.mp4</p>"#;
        let res = StreamResolver::new().resolve(html, None);
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].url, "https://cdn/a.mp4");
    }

    #[test]
    fn fallbacks_used_when_primaries_empty() {
        let html = r#"<div data-stream="https://cdn/p/1"></div><p>see https://cdn/x/film.m3u8</p>"#;
        let res = StreamResolver::new().resolve(html, None);
        let got: Vec<_> = res
            .candidates
            .iter()
            .map(|c| (c.url.as_str(), c.confidence))
            .collect();
        assert_eq!(
            got,
            [
                ("https://cdn/x/film.m3u8", Confidence::Pattern),
                ("https://cdn/p/1", Confidence::Heuristic)
            ]
        );
    }

    #[test]
    fn duplicates_keep_highest_confidence() {
        let html = r#"<script>sources = [{"src":"https://cdn/a.mp4","label":"720p"}];</script>
                      <video><source src="https://cdn/a.mp4"></video>"#;
        let res = StreamResolver::new().resolve(html, None);
        assert_eq!(res.candidates.len(), 1);
        let c = &res.candidates[0];
        assert_eq!(c.confidence, Confidence::Direct);
        assert_eq!(c.strategy, "source-tag");
        assert_eq!(c.label.as_deref(), Some("720p"));
    }

    #[test]
    fn unknown_format_sorted_last() {
        let html = r#"<video><source src="https://cdn/watch/1"></video>
                      <script>sources = [{"src":"https://cdn/b.m3u8"}];</script>"#;
        let res = StreamResolver::new().resolve(html, None);
        let urls: Vec<_> = res.candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://cdn/b.m3u8", "https://cdn/watch/1"]);
    }

    #[test]
    fn soft_failure_recorded_and_later_strategies_run() {
        let html = r#"<script>playerConfig = {bad json};</script><p>https://cdn/z.mp4</p>"#;
        let res = StreamResolver::new().resolve(html, None);
        assert_eq!(res.soft_failures.len(), 1);
        assert!(res.soft_failures[0].starts_with("player-config:"));
        assert_eq!(res.candidates[0].url, "https://cdn/z.mp4");
    }

    #[test]
    fn custom_pipeline() {
        let resolver = StreamResolver::with_strategies(vec![Box::new(
            crate::stream::strategy::UrlPatternStrategy::new(),
        )]);
        assert_eq!(resolver.strategy_names(), ["url-pattern"]);
        let res = resolver.resolve("https://cdn/q.mp4", None);
        assert_eq!(res.candidates.len(), 1);
    }
}
