//! Raw-text URL patterns.
//!
//! Last structural resort: known URL shapes matched against the whole page
//! text, catching sources hidden in markup the other strategies don't model.
//!
//! ## Patterns
//!
//! - `https://…/x.m3u8?…` - HLS manifests
//! - `https://…/x.mp4?…` - progressive files
//! - `https://…/hls/…` - CDN HLS path convention
//! - `https://…/manifest` - extensionless manifest endpoints
//! - `https://<id>.cloudfront.net/…` - the site's CloudFront distribution

use regex::Regex;

use super::{is_non_media, ExtractionStrategy, PageContext};
use crate::error::Result;
use crate::stream::candidate::{Confidence, StreamCandidate};

pub struct UrlPatternStrategy {
    patterns: Vec<UrlPattern>,
}

struct UrlPattern {
    name: &'static str,
    regex: Regex,
}

const URL_BODY: &str = r#"[^\s"'<>()\\,;]"#;

impl UrlPatternStrategy {
    pub fn new() -> Self {
        let table: [(&'static str, String); 5] = [
            (
                "hls_manifest",
                format!(r"(?i)https?://{URL_BODY}+?\.m3u8(?:\?{URL_BODY}*)?"),
            ),
            (
                "mp4_file",
                format!(r"(?i)https?://{URL_BODY}+?\.mp4(?:\?{URL_BODY}*)?"),
            ),
            ("hls_path", format!(r"(?i)https?://{URL_BODY}+/hls/{URL_BODY}+")),
            (
                "manifest_path",
                format!(r"(?i)https?://{URL_BODY}+/manifest\b(?:[/?.]{URL_BODY}*)?"),
            ),
            (
                "cloudfront",
                format!(r"(?i)https?://[a-z0-9]+\.cloudfront\.net/{URL_BODY}+"),
            ),
        ];

        let patterns = table
            .into_iter()
            .map(|(name, pattern)| UrlPattern {
                name,
                regex: Regex::new(&pattern).expect("valid regex"),
            })
            .collect();
        Self { patterns }
    }
}

impl Default for UrlPatternStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for UrlPatternStrategy {
    fn name(&self) -> &'static str {
        "url-pattern"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Pattern
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Vec<StreamCandidate>> {
        let text = page.raw.replace("\\/", "/").replace("&amp;", "&");

        // (position, url) so overlapping patterns report in page order
        let mut hits: Vec<(usize, String)> = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(&text) {
                let url = m.as_str().to_string();
                if is_non_media(&url) {
                    continue;
                }
                tracing::trace!(pattern = pattern.name, %url, "Pattern hit");
                hits.push((m.start(), url));
            }
        }
        hits.sort_by_key(|(pos, _)| *pos);

        let mut found: Vec<StreamCandidate> = Vec::new();
        for (_, url) in hits {
            // A longer match at the same spot (query string) supersedes a shorter one
            if found.iter().any(|c| c.url == url || c.url.starts_with(&url) || url.starts_with(&c.url)) {
                continue;
            }
            found.push(StreamCandidate::new(url, None, self.confidence(), self.name()));
        }
        Ok(found)
    }
}
