use anyhow::Result;
use serde::Serialize;

use dafilms::{Diagnostic, FilmDetails, FilmSummary, PlayItem, Resolution};

/// Human-readable or JSON output, chosen by `--json`.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize + ?Sized>(self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }

    pub fn films(self, films: &[FilmSummary]) -> Result<()> {
        self.emit(films, || {
            for film in films {
                println!("{:<40} {}", film.id, film.title);
            }
            println!("\n({} films)", films.len());
        })
    }

    pub fn details(self, details: &FilmDetails) -> Result<()> {
        self.emit(details, || {
            println!("🎬 {}", details.title);
            if let Some(director) = &details.director {
                println!("   Director: {director}");
            }
            if !details.cast.is_empty() {
                println!("   Cast: {}", details.cast.join(", "));
            }
            if let Some(thumb) = &details.thumbnail_url {
                println!("   Poster: {thumb}");
            }
            if !details.plot.is_empty() {
                println!("\n{}", details.plot);
            }
        })
    }

    pub fn resolution(self, resolution: &Resolution) -> Result<()> {
        self.emit(resolution, || {
            for (i, c) in resolution.candidates.iter().enumerate() {
                let label = c.label.as_deref().unwrap_or("-");
                println!("{:>2}. [{}/{}] {} ({label}, {})", i + 1, c.format, c.confidence, c.url, c.strategy);
            }
            for failure in &resolution.soft_failures {
                println!("⚠️  {failure}");
            }
            if let Some(diagnostic) = &resolution.diagnostic {
                print_diagnostic(diagnostic);
            }
        })
    }

    pub fn play_item(self, item: &PlayItem) -> Result<()> {
        self.emit(item, || {
            println!("▶️  {}", item.title);
            println!("   {}", item.path);
            if let Some(mime) = &item.mime_type {
                println!("   mime: {mime}");
            }
            for (key, value) in &item.properties {
                println!("   {key} = {value}");
            }
        })
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    print!("{diagnostic}");
    if diagnostic.mentions_video() {
        println!("   (page mentions video, but no URL could be extracted)");
    }
}
