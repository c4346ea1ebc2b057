//! Playback selection and play-item construction.
//!
//! The resolver hands over every candidate; this layer keeps the ones the
//! active engine can play, tries them in order, and describes the winning
//! stream the way the host player expects (adaptive-stream properties for
//! HLS, a MIME type for direct files).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DafilmsError, Result};
use crate::stream::{StreamCandidate, StreamFormat};

/// Adaptive-stream input addon used for HLS.
pub const ADAPTIVE_INPUTSTREAM: &str = "inputstream.adaptive";

/// What the active playback engine can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackEngine {
    pub supports_hls: bool,
    pub supports_mp4: bool,
    /// Whether to attempt UNKNOWN-format URLs as adaptive streams.
    pub supports_unknown: bool,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self {
            supports_hls: true,
            supports_mp4: true,
            supports_unknown: true,
        }
    }
}

impl PlaybackEngine {
    /// Engine without the adaptive input addon: direct files only.
    pub fn direct_only() -> Self {
        Self {
            supports_hls: false,
            supports_mp4: true,
            supports_unknown: false,
        }
    }

    pub fn supports(&self, format: StreamFormat) -> bool {
        match format {
            StreamFormat::Hls => self.supports_hls,
            StreamFormat::Mp4 => self.supports_mp4,
            StreamFormat::Unknown => self.supports_unknown,
        }
    }
}

/// Ordered playback attempts for one film.
#[derive(Debug, Clone)]
pub struct PlaybackPlan {
    film_id: String,
    attempts: Vec<StreamCandidate>,
}

impl PlaybackPlan {
    /// Keep the supported candidates in rank order.
    ///
    /// With `prefer_hd`, the highest-quality candidate among those tied with
    /// the first on format and confidence is moved to the front.
    pub fn new(
        film_id: impl Into<String>,
        candidates: Vec<StreamCandidate>,
        engine: PlaybackEngine,
        prefer_hd: bool,
    ) -> Self {
        let mut attempts: Vec<StreamCandidate> = candidates
            .into_iter()
            .filter(|c| engine.supports(c.format))
            .collect();

        if prefer_hd && attempts.len() > 1 {
            let head = (attempts[0].format, attempts[0].confidence);
            let tied = attempts
                .iter()
                .take_while(|c| (c.format, c.confidence) == head)
                .count();
            // max_by_key returns the last maximum; iterate reversed so the first one wins
            if let Some(best) = attempts[..tied]
                .iter()
                .enumerate()
                .rev()
                .max_by_key(|(_, c)| c.quality.unwrap_or(0))
                .map(|(i, _)| i)
            {
                let chosen = attempts.remove(best);
                attempts.insert(0, chosen);
            }
        }

        Self {
            film_id: film_id.into(),
            attempts,
        }
    }

    pub fn attempts(&self) -> &[StreamCandidate] {
        &self.attempts
    }

    pub fn first(&self) -> Option<&StreamCandidate> {
        self.attempts.first()
    }

    /// Try candidates in order until `play` succeeds.
    ///
    /// Failures are logged and the next candidate is tried. Returns
    /// [`DafilmsError::NoStreamFound`] when every attempt fails or there
    /// were none.
    pub fn play_with<T, F>(&self, mut play: F) -> Result<T>
    where
        F: FnMut(&StreamCandidate) -> Result<T>,
    {
        for (i, candidate) in self.attempts.iter().enumerate() {
            match play(candidate) {
                Ok(value) => {
                    info!(attempt = i + 1, url = %candidate.url, format = %candidate.format, "Playback started");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(attempt = i + 1, url = %candidate.url, error = %e, "Playback attempt failed");
                }
            }
        }
        Err(DafilmsError::NoStreamFound {
            film_id: self.film_id.clone(),
        })
    }
}

/// A playable item as handed to the host player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayItem {
    pub title: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Player properties (`inputstream`, `inputstream.adaptive.*`).
    pub properties: BTreeMap<String, String>,
    pub content_lookup: bool,
}

impl PlayItem {
    /// Describe `candidate` for the player.
    pub fn for_candidate(title: &str, candidate: &StreamCandidate, user_agent: &str) -> Self {
        let mut properties = BTreeMap::new();
        let headers = format!("User-Agent={user_agent}");
        let mut mime_type = None;

        match candidate.format {
            StreamFormat::Hls => {
                properties.insert("inputstream".into(), ADAPTIVE_INPUTSTREAM.into());
                properties.insert("inputstream.adaptive.manifest_type".into(), "hls".into());
                properties.insert("inputstream.adaptive.manifest_update_parameter".into(), "full".into());
                properties.insert("inputstream.adaptive.stream_headers".into(), headers);
            }
            StreamFormat::Mp4 => {
                properties.insert("inputstream".into(), String::new());
                mime_type = Some("video/mp4".to_string());
                if candidate.url.contains("cloudfront.net") {
                    properties.insert("inputstream.adaptive.stream_headers".into(), headers);
                }
            }
            StreamFormat::Unknown => {
                properties.insert("inputstream".into(), ADAPTIVE_INPUTSTREAM.into());
                properties.insert("inputstream.adaptive.manifest_type".into(), "hls".into());
            }
        }

        Self {
            title: title.to_string(),
            path: candidate.url.clone(),
            mime_type,
            properties,
            content_lookup: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Confidence;

    fn candidate(url: &str, confidence: Confidence, label: Option<&str>) -> StreamCandidate {
        StreamCandidate::new(url, None, confidence, "test").with_label(label.map(str::to_string))
    }

    #[test]
    fn filters_unsupported_formats() {
        let plan = PlaybackPlan::new(
            "1",
            vec![
                candidate("https://c/a.m3u8", Confidence::Direct, None),
                candidate("https://c/b.mp4", Confidence::Script, None),
            ],
            PlaybackEngine::direct_only(),
            false,
        );
        let urls: Vec<_> = plan.attempts().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://c/b.mp4"]);
    }

    #[test]
    fn prefers_hd_among_tied_candidates() {
        let plan = PlaybackPlan::new(
            "1",
            vec![
                candidate("https://c/sd.mp4", Confidence::Script, Some("360p")),
                candidate("https://c/hd.mp4", Confidence::Script, Some("720p")),
                candidate("https://c/fhd.mp4", Confidence::Pattern, Some("1080p")),
            ],
            PlaybackEngine::default(),
            true,
        );
        let urls: Vec<_> = plan.attempts().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://c/hd.mp4", "https://c/sd.mp4", "https://c/fhd.mp4"]);
    }

    #[test]
    fn no_quality_info_keeps_order() {
        let plan = PlaybackPlan::new(
            "1",
            vec![
                candidate("https://c/one.mp4", Confidence::Direct, None),
                candidate("https://c/two.mp4", Confidence::Direct, None),
            ],
            PlaybackEngine::default(),
            true,
        );
        assert_eq!(plan.first().unwrap().url, "https://c/one.mp4");
    }

    #[test]
    fn falls_back_to_next_candidate() {
        let plan = PlaybackPlan::new(
            "9",
            vec![
                candidate("https://c/broken.m3u8", Confidence::Direct, None),
                candidate("https://c/ok.mp4", Confidence::Direct, None),
            ],
            PlaybackEngine::default(),
            false,
        );
        let mut tried = Vec::new();
        let played = plan
            .play_with(|c| {
                tried.push(c.url.clone());
                if c.format == StreamFormat::Hls {
                    Err(DafilmsError::Parse("manifest 404".into()))
                } else {
                    Ok(c.url.clone())
                }
            })
            .unwrap();
        assert_eq!(played, "https://c/ok.mp4");
        assert_eq!(tried.len(), 2);
    }

    #[test]
    fn all_attempts_failing_is_no_stream() {
        let plan = PlaybackPlan::new("9", vec![], PlaybackEngine::default(), true);
        let err = plan.play_with(|_| Ok::<_, DafilmsError>(())).unwrap_err();
        assert!(matches!(err, DafilmsError::NoStreamFound { film_id } if film_id == "9"));
    }

    #[test]
    fn play_item_properties() {
        let hls = candidate("https://c/a.m3u8", Confidence::Direct, None);
        let item = PlayItem::for_candidate("Film", &hls, "Kodi/DAFilms Addon");
        assert_eq!(item.properties["inputstream"], ADAPTIVE_INPUTSTREAM);
        assert_eq!(item.properties["inputstream.adaptive.manifest_type"], "hls");
        assert_eq!(
            item.properties["inputstream.adaptive.stream_headers"],
            "User-Agent=Kodi/DAFilms Addon"
        );
        assert!(item.mime_type.is_none());
        assert!(!item.content_lookup);

        let mp4 = candidate("https://d1.cloudfront.net/a.mp4", Confidence::Direct, None);
        let item = PlayItem::for_candidate("Film", &mp4, "UA");
        assert_eq!(item.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(item.properties["inputstream"], "");
        assert!(item.properties.contains_key("inputstream.adaptive.stream_headers"));

        let plain = candidate("https://cdn/a.mp4", Confidence::Direct, None);
        let item = PlayItem::for_candidate("Film", &plain, "UA");
        assert!(!item.properties.contains_key("inputstream.adaptive.stream_headers"));
    }
}
