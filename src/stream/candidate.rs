//! Stream candidates and their ranking primitives.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Delivery format guessed from the URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamFormat {
    /// HTTP Live Streaming manifest.
    Hls,
    /// Progressive MP4 file.
    Mp4,
    /// Anything else; always ranked last.
    Unknown,
}

impl StreamFormat {
    /// Classify a URL.
    ///
    /// A `.m3u8` path or a known HLS path segment is [`Hls`](Self::Hls); a
    /// direct video-file extension is [`Mp4`](Self::Mp4).
    pub fn classify(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        let path = lower
            .split(['?', '#'])
            .next()
            .unwrap_or(lower.as_str());

        if path.ends_with(".m3u8") || HLS_SEGMENTS.iter().any(|s| path.contains(s)) {
            Self::Hls
        } else if VIDEO_FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            Self::Mp4
        } else {
            Self::Unknown
        }
    }

    /// Classify from a declared MIME type such as `application/x-mpegURL`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.contains("mpegurl") || mime == "hls" {
            Some(Self::Hls)
        } else if mime == "video/mp4" || mime == "mp4" || mime == "video/webm" {
            Some(Self::Mp4)
        } else {
            None
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hls => "HLS",
            Self::Mp4 => "MP4",
            Self::Unknown => "UNKNOWN",
        })
    }
}

const HLS_SEGMENTS: &[&str] = &["/hls/", ".m3u8/", "/playlist.m3u8", "format=m3u8"];
const VIDEO_FILE_EXTENSIONS: &[&str] = &[".mp4", ".m4v", ".mov", ".webm"];

/// How much an extraction strategy is trusted. Variants are declared in
/// ascending order so the derived [`Ord`] is the ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Confidence {
    /// Attribute-name guess.
    #[serde(rename = "LOW")]
    Heuristic,
    /// Raw-text URL pattern.
    #[serde(rename = "PATTERN")]
    Pattern,
    /// Parsed player configuration.
    #[serde(rename = "MEDIUM")]
    Script,
    /// Explicit `<source>`/`<video src>` markup.
    #[serde(rename = "HIGH")]
    Direct,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Heuristic => "LOW",
            Self::Pattern => "PATTERN",
            Self::Script => "MEDIUM",
            Self::Direct => "HIGH",
        })
    }
}

/// A resolved URL plus format guess, not yet confirmed playable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamCandidate {
    pub url: String,
    pub format: StreamFormat,
    pub confidence: Confidence,
    /// Player label such as `"720p"` or `"HD"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Vertical resolution, when the label or URL reveals it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// Name of the strategy that produced this candidate.
    pub strategy: &'static str,
}

impl StreamCandidate {
    /// Build a candidate, classifying the format from `declared_type` first
    /// and falling back to the URL shape.
    pub fn new(
        url: impl Into<String>,
        declared_type: Option<&str>,
        confidence: Confidence,
        strategy: &'static str,
    ) -> Self {
        let url = normalize_url(&url.into());
        let by_url = StreamFormat::classify(&url);
        let format = match declared_type.and_then(StreamFormat::from_mime) {
            Some(declared) if by_url == StreamFormat::Unknown => declared,
            Some(declared) if declared == by_url => declared,
            // URL shape wins over a contradicting declaration.
            Some(_) | None => by_url,
        };
        let quality = quality_from(&url);
        Self {
            url,
            format,
            confidence,
            label: None,
            quality,
            strategy,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        if let Some(label) = label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
            if self.quality.is_none() {
                self.quality = quality_from(&label).or_else(|| {
                    let upper = label.to_ascii_uppercase();
                    match upper.as_str() {
                        "FULLHD" | "FHD" => Some(1080),
                        "HD" => Some(720),
                        "SD" => Some(480),
                        _ => None,
                    }
                });
            }
            self.label = Some(label);
        }
        self
    }

    /// Ranking order: known formats before UNKNOWN, then higher confidence.
    /// Equal keys compare equal so a stable sort keeps discovery order.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .format
            .is_known()
            .cmp(&self.format.is_known())
            .then_with(|| other.confidence.cmp(&self.confidence))
    }
}

static QUALITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^0-9])(2160|1440|1080|720|576|480|360|240)p").expect("valid regex"));

fn quality_from(text: &str) -> Option<u32> {
    QUALITY_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Undo the escaping pages apply to URLs embedded in scripts and attributes.
pub fn normalize_url(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&")
}
