//! Explicit video markup: `<video><source src type></video>` and `<video src>`.

use super::{is_non_media, ExtractionStrategy, PageContext};
use crate::error::Result;
use crate::stream::candidate::{Confidence, StreamCandidate};

pub struct SourceTagStrategy;

impl ExtractionStrategy for SourceTagStrategy {
    fn name(&self) -> &'static str {
        "source-tag"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Direct
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Vec<StreamCandidate>> {
        let mut found = Vec::new();

        for node in page.document.select("video[src], source[src]")? {
            // <picture><source> and typed image sources are artwork
            if node.is("source") && node.ancestor("picture").is_some() {
                continue;
            }
            let declared = node.attr("type");
            if declared.is_some_and(|t| t.trim_start().starts_with("image/")) {
                continue;
            }

            let Some(raw) = node.attr("src") else { continue };
            let Some(url) = page.absolute_url(raw) else {
                tracing::debug!(src = raw, "Skipping unresolvable source");
                continue;
            };
            if is_non_media(&url) {
                continue;
            }

            let label = node
                .attr("label")
                .or_else(|| node.attr("res"))
                .or_else(|| node.attr("data-quality"))
                .or_else(|| node.attr("title"))
                .map(str::to_string);

            found.push(
                StreamCandidate::new(url, declared, self.confidence(), self.name()).with_label(label),
            );
        }

        Ok(found)
    }
}
