//! Attribute-name guess: `data-video-url`, `data-stream`, `data-file` and the like.

use super::{is_non_media, ExtractionStrategy, PageContext};
use crate::error::Result;
use crate::stream::candidate::{Confidence, StreamCandidate};

const NAME_HINTS: &[&str] = &["video", "stream", "file", "src", "hls", "mp4", "m3u8"];
/// Elements whose URLs are assets, embeds, or already handled by the source-tag scan.
const IGNORED_TAGS: &[&str] = &[
    "img", "script", "link", "meta", "iframe", "source", "video", "picture", "style",
];

pub struct HeuristicStrategy;

impl ExtractionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Heuristic
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Vec<StreamCandidate>> {
        let mut found: Vec<StreamCandidate> = Vec::new();

        for node in page.document.elements() {
            if IGNORED_TAGS.iter().any(|t| node.is(t)) {
                continue;
            }
            for (name, value) in node.attrs() {
                let name = name.to_ascii_lowercase();
                if name == "href" || !NAME_HINTS.iter().any(|h| name.contains(h)) {
                    continue;
                }
                let Some(url) = page.absolute_url(value) else { continue };
                if is_non_media(&url) || found.iter().any(|c| c.url == url) {
                    continue;
                }
                found.push(StreamCandidate::new(url, None, self.confidence(), self.name()));
            }
        }

        Ok(found)
    }
}
