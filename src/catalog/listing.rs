//! Film-card and payment-table parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::{absolutize, film_id_from_url, FilmSummary};
use crate::config::Settings;
use crate::error::Result;
use crate::stream::{Node, PageDocument};

/// Payment purpose text for a film purchase.
const PURCHASE_PURPOSE: &str = "Stažení filmu";
const UNKNOWN_TITLE: &str = "Unknown Title";

static STYLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(['"]([^'"]+)['"]\)"#).expect("valid regex"));

/// Parse up to `limit` film cards from a listing, search or collection page.
///
/// Cards without a link are skipped.
pub fn parse_film_cards(html: &str, settings: &Settings, limit: usize) -> Result<Vec<FilmSummary>> {
    let document = PageDocument::parse(html);
    let mut films = Vec::new();

    for card in document.select(r#"li[data-film-item="true"]"#)? {
        if films.len() >= limit {
            break;
        }
        let Some(link) = card.select("a.ui-movie-card__link")?.into_iter().next() else {
            continue;
        };
        let Some(href) = link.attr("href") else { continue };

        let detail_url = absolutize(settings, href);
        let Some(id) = film_id_from_url(&detail_url) else {
            tracing::debug!(href, "Card link has no film id");
            continue;
        };

        let title = card_title(card)?;
        let thumbnail_url = card_thumbnail(card, link)?;

        films.push(FilmSummary {
            id,
            title,
            thumbnail_url,
            detail_url,
        });
    }

    Ok(films)
}

fn card_title(card: Node<'_>) -> Result<String> {
    for css in [".ui-movie-card__link--title", ".ui-movie-card__title"] {
        if let Some(node) = card.select(css)?.into_iter().next() {
            let text = node.text_trimmed();
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }
    Ok(UNKNOWN_TITLE.to_string())
}

/// Background image in the link's inline style, else the first `<img>`.
fn card_thumbnail(card: Node<'_>, link: Node<'_>) -> Result<Option<String>> {
    if let Some(style) = link.attr("style") {
        if let Some(url) = STYLE_URL.captures(style).and_then(|c| c.get(1)) {
            return Ok(Some(url.as_str().to_string()));
        }
    }
    Ok(card
        .select("img[src]")?
        .into_iter()
        .find_map(|img| img.attr("src"))
        .map(str::to_string))
}

/// Parse purchased films from the payment history table.
///
/// Rows whose purpose column mentions a film download and links to a film
/// are kept, once per film.
pub fn parse_purchased_films(html: &str, settings: &Settings) -> Result<Vec<FilmSummary>> {
    let document = PageDocument::parse(html);
    let Some(table) = document.select("table.table-responsive")?.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut films: Vec<FilmSummary> = Vec::new();
    for row in table.select("tbody tr")? {
        let cells = row.select("td")?;
        let Some(purpose) = cells.get(1) else { continue };
        if !purpose.text().contains(PURCHASE_PURPOSE) {
            continue;
        }
        let Some(link) = purpose
            .select("a[href]")?
            .into_iter()
            .find(|a| a.attr("href").is_some_and(|h| h.contains("film/")))
        else {
            continue;
        };
        let Some(href) = link.attr("href") else { continue };
        let detail_url = absolutize(settings, href);
        let Some(id) = film_id_from_url(&detail_url) else { continue };
        if films.iter().any(|f| f.id == id) {
            continue;
        }
        films.push(FilmSummary {
            id,
            title: link.text_trimmed(),
            thumbnail_url: None,
            detail_url,
        });
    }

    Ok(films)
}
