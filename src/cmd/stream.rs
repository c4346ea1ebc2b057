use std::path::Path;

use anyhow::{Context, Result};

use dafilms::{DafilmsError, FilmService, PlaybackEngine, SiteClient, StreamResolver};

use super::output::Output;

/// Resolve a saved page without touching the network.
pub fn cmd_resolve_file(path: &Path, base_url: Option<&str>, out: Output) -> Result<()> {
    let body = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let resolution = StreamResolver::new().resolve_player_response(&body, base_url);
    out.resolution(&resolution)?;

    if resolution.is_empty() {
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        return Err(DafilmsError::NoStreamFound { film_id: name }.into());
    }
    Ok(())
}

pub async fn cmd_resolve(service: &mut FilmService<SiteClient>, film_id: &str, out: Output) -> Result<()> {
    let resolution = service.resolve_film(film_id).await?;
    out.resolution(&resolution)?;

    if resolution.is_empty() {
        return Err(DafilmsError::NoStreamFound {
            film_id: film_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub async fn cmd_play(
    service: &mut FilmService<SiteClient>,
    film_id: &str,
    title: Option<&str>,
    direct_only: bool,
    out: Output,
) -> Result<()> {
    let engine = if direct_only {
        PlaybackEngine::direct_only()
    } else {
        PlaybackEngine::default()
    };
    let item = service.play(film_id, title.unwrap_or(film_id), engine).await?;
    out.play_item(&item)
}
