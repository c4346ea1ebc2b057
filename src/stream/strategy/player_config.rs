//! Embedded player configuration.
//!
//! Player setups are usually a JSON literal assigned inside a larger script:
//! `playerConfig = {...};`, `sources = [...]`, `jwplayer("p").setup({...})`
//! or `videojs("p", {...})`. A known key prefix locates the literal, a
//! string-aware bracket matcher cuts it out, and only that slice is parsed.

use std::ops::Range;

use regex::Regex;
use serde_json::Value;

use super::{is_non_media, ExtractionStrategy, PageContext};
use crate::error::{DafilmsError, Result};
use crate::stream::candidate::{Confidence, StreamCandidate};

/// Keys whose string value is a media URL.
const URL_KEYS: &[&str] = &["src", "file", "url", "hls", "stream", "manifest", "streamUrl"];
/// Keys whose subtree never holds playable sources.
const SKIP_KEYS: &[&str] = &["tracks", "captions", "subtitles", "images", "poster", "thumbnails"];
const LABEL_KEYS: &[&str] = &["label", "quality", "res", "height"];

pub struct PlayerConfigStrategy {
    markers: Vec<Regex>,
}

impl PlayerConfigStrategy {
    pub fn new() -> Self {
        let markers = [
            r"playerConfig\s*=\s*",
            r#"["']?\bsources["']?\s*[:=]\s*"#,
            r"\.setup\(\s*",
            r"videojs\(\s*[^,()]*,\s*",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect();
        Self { markers }
    }

    /// Parse every balanced literal that follows a marker, outermost first.
    ///
    /// A literal nested in one that already parsed is skipped. When an outer
    /// literal is not valid JSON (unquoted keys, trailing commas), the
    /// literals nested in it are still tried.
    fn configs(&self, script: &str) -> (Vec<Value>, Option<serde_json::Error>) {
        let mut starts: Vec<usize> = self
            .markers
            .iter()
            .flat_map(|re| re.find_iter(script).map(|m| m.end()))
            .filter(|&end| matches!(script[end..].chars().next(), Some('{' | '[')))
            .collect();
        starts.sort_unstable();
        starts.dedup();

        let mut parsed: Vec<Range<usize>> = Vec::new();
        let mut configs = Vec::new();
        let mut last_error = None;
        for start in starts {
            if parsed.iter().any(|r| r.contains(&start)) {
                continue;
            }
            let Some(literal) = extract_json_literal(&script[start..]) else { continue };
            match serde_json::from_str::<Value>(literal) {
                Ok(config) => {
                    parsed.push(start..start + literal.len());
                    configs.push(config);
                }
                Err(e) => {
                    let preview: String = literal.chars().take(80).collect();
                    tracing::debug!(error = %e, preview = %preview, "Player config block is not JSON");
                    last_error = Some(e);
                }
            }
        }
        (configs, last_error)
    }
}

impl Default for PlayerConfigStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for PlayerConfigStrategy {
    fn name(&self) -> &'static str {
        "player-config"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Script
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Vec<StreamCandidate>> {
        let mut scripts = page.document.inline_scripts();
        if page.document.script_count() == 0 {
            // Bare JavaScript bodies have no <script> wrapper
            scripts.push(page.raw.to_string());
        }

        let mut found = Vec::new();
        let mut last_error = None;

        for script in &scripts {
            let (configs, error) = self.configs(script);
            if let Some(e) = error {
                tracing::warn!(error = %e, "Skipping invalid player config block");
                last_error = Some(DafilmsError::Parse(format!("invalid player config: {e}")));
            }
            for config in configs {
                let mut entries = Vec::new();
                collect_sources(&config, &mut entries);
                for entry in entries {
                    let Some(url) = page.absolute_url(&entry.url) else { continue };
                    if is_non_media(&url) {
                        continue;
                    }
                    found.push(
                        StreamCandidate::new(url, entry.mime.as_deref(), self.confidence(), self.name())
                            .with_label(entry.label),
                    );
                }
            }
        }

        // A broken block only matters when nothing else in the page parsed
        match last_error {
            Some(err) if found.is_empty() => Err(err),
            _ => Ok(found),
        }
    }
}

struct SourceEntry {
    url: String,
    mime: Option<String>,
    label: Option<String>,
}

/// Walk a config value collecting source entries in document order.
fn collect_sources(value: &Value, out: &mut Vec<SourceEntry>) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    out.push(SourceEntry {
                        url: s.clone(),
                        mime: None,
                        label: None,
                    });
                } else {
                    collect_sources(item, out);
                }
            }
        }
        Value::Object(map) => {
            let url = URL_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str));
            if let Some(url) = url {
                let mime = map.get("type").and_then(Value::as_str).map(str::to_string);
                let label = LABEL_KEYS.iter().find_map(|k| match map.get(*k) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(format!("{n}p")),
                    _ => None,
                });
                out.push(SourceEntry {
                    url: url.to_string(),
                    mime,
                    label,
                });
            }
            for (key, child) in map {
                if SKIP_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if matches!(child, Value::Array(_) | Value::Object(_)) {
                    collect_sources(child, out);
                }
            }
        }
        _ => {}
    }
}

/// Cut the balanced `{...}` or `[...]` literal at the start of `s`.
///
/// Quotes (double or single) and backslash escapes are honoured so brackets
/// inside strings do not count.
pub fn extract_json_literal(s: &str) -> Option<&str> {
    let first_char = s.chars().next()?;
    let (open, close) = match first_char {
        '{' => ('{', '}'),
        '[' => ('[', ']'),
        _ => return None,
    };

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match (quote, c) {
            (Some(_), '\\') => escape_next = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c == open => depth += 1,
            (None, c) if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::candidate::StreamFormat;
    use crate::stream::page::PageDocument;

    fn run(html: &str) -> Result<Vec<StreamCandidate>> {
        let document = PageDocument::parse(html);
        let page = PageContext {
            document: &document,
            raw: html,
            base_url: None,
        };
        PlayerConfigStrategy::new().extract(&page)
    }

    #[test]
    fn extracts_balanced_literals() {
        assert_eq!(extract_json_literal(r#"{"a":{"b":1}};x"#), Some(r#"{"a":{"b":1}}"#));
        assert_eq!(extract_json_literal(r#"["]",'[']"#), Some(r#"["]",'[']"#));
        assert_eq!(extract_json_literal(r#"{"a":"\"}"}"#), Some(r#"{"a":"\"}"}"#));
        assert_eq!(extract_json_literal("{unterminated"), None);
        assert_eq!(extract_json_literal("x"), None);
    }

    #[test]
    fn json_array_inside_js_object_literal() {
        let found = run(
            r#"<script>playerConfig = {autoplay: true, sources: [{"src":"https://cdn.example/a.m3u8","label":"720p"}]};</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://cdn.example/a.m3u8");
        assert_eq!(found[0].confidence, Confidence::Script);
        assert_eq!(found[0].label.as_deref(), Some("720p"));
    }

    #[test]
    fn player_config_object() {
        let found = run(
            r#"<script>var x = 1; playerConfig = {"sources":[{"src":"https://cdn.example/stream.m3u8"}]}; init();</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://cdn.example/stream.m3u8");
        assert_eq!(found[0].format, StreamFormat::Hls);
        assert_eq!(found[0].confidence, Confidence::Script);
    }

    #[test]
    fn sources_array_with_escaped_slashes_and_labels() {
        let found = run(
            r#"<script>
                var sources = [{"src":"https:\/\/d1.cloudfront.net\/f\/film_360p.mp4","type":"video\/mp4","label":"360p"},
                               {"src":"https:\/\/d1.cloudfront.net\/f\/film_720p.mp4","type":"video\/mp4","label":"720p"}];
                player.src(sources);
            </script>"#,
        )
        .unwrap();
        let urls: Vec<_> = found.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://d1.cloudfront.net/f/film_360p.mp4",
                "https://d1.cloudfront.net/f/film_720p.mp4"
            ]
        );
        assert_eq!(found[1].quality, Some(720));
    }

    #[test]
    fn jwplayer_setup_skips_tracks() {
        let found = run(
            r#"<script>jwplayer("p").setup({"playlist":[{"file":"https://cdn/a.m3u8","tracks":[{"file":"https://cdn/cs.vtt"}]}]});</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://cdn/a.m3u8");
    }

    #[test]
    fn videojs_options() {
        let found = run(
            r#"<script>videojs('player', {"sources": ["https://cdn/b.m3u8"]});</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://cdn/b.m3u8");
    }

    #[test]
    fn invalid_block_is_soft_failure() {
        let err = run(r#"<script>playerConfig = {sources: [{src: 'https://cdn/a.mp4'}]};</script>"#)
            .unwrap_err();
        assert!(matches!(err, DafilmsError::Parse(_)));
    }

    #[test]
    fn invalid_block_ignored_when_another_parses() {
        let found = run(
            r#"<script>broken = 1; playerConfig = {oops};</script>
               <script>sources = [{"file":"https://cdn/ok.mp4"}];</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn nested_marker_not_double_counted() {
        let found = run(
            r#"<script>playerConfig = {"sources":[{"src":"https://cdn/a.mp4"}]};</script>"#,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn bare_script_body() {
        let found = run(r#"sources = [{"src":"https://cdn/raw.m3u8"}];"#).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn no_config_is_empty() {
        assert!(run("<script>console.log('hi')</script>").unwrap().is_empty());
    }
}
