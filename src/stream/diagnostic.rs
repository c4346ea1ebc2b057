//! Diagnostic records for pages where no stream could be found.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::page::PageDocument;
use crate::error::Result;

const EXCERPT_CHARS: usize = 2000;
const MARKERS: &[&str] = &["<video", "<source", "m3u8", "mp4", "sources", "player", "<iframe"];

/// Enough of a failed page for a human to see why extraction missed.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    pub byte_len: usize,
    pub script_count: usize,
    /// Occurrence counts of telltale substrings, case-insensitive.
    pub markers: Vec<(&'static str, usize)>,
    /// Leading characters of the page.
    pub excerpt: String,
    pub truncated: bool,
}

impl Diagnostic {
    pub fn capture(raw: &str, page_url: Option<&str>, document: &PageDocument) -> Self {
        let lower = raw.to_lowercase();
        let markers = MARKERS
            .iter()
            .map(|m| (*m, lower.matches(m).count()))
            .collect();

        let excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();
        let truncated = excerpt.len() < raw.len();

        Self {
            page_url: page_url.map(str::to_string),
            byte_len: raw.len(),
            script_count: document.script_count(),
            markers,
            excerpt,
            truncated,
        }
    }

    /// `true` when the page mentions video at all, i.e. the markup changed
    /// rather than the film being unavailable.
    pub fn mentions_video(&self) -> bool {
        self.markers.iter().any(|(_, n)| *n > 0)
    }

    /// Dump the raw page into `dir` for offline inspection.
    pub fn write_to(dir: &Path, film_id: &str, raw: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let safe_id: String = film_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!("dafilms_player_{safe_id}_{stamp}.html"));
        std::fs::write(&path, raw)?;
        Ok(path)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No stream found")?;
        if let Some(url) = &self.page_url {
            writeln!(f, "  page: {url}")?;
        }
        writeln!(f, "  size: {} bytes, {} scripts", self.byte_len, self.script_count)?;
        let markers: Vec<String> = self
            .markers
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(m, n)| format!("{m}={n}"))
            .collect();
        if markers.is_empty() {
            writeln!(f, "  markers: none")?;
        } else {
            writeln!(f, "  markers: {}", markers.join(" "))?;
        }
        writeln!(f, "  excerpt:")?;
        for line in self.excerpt.lines().take(40) {
            writeln!(f, "    {line}")?;
        }
        if self.truncated {
            writeln!(f, "    ... [{} more bytes]", self.byte_len - self.excerpt.len())?;
        }
        Ok(())
    }
}
