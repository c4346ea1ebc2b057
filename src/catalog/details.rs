//! Film details from the detail page's JSON-LD `Movie` block.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DafilmsError, Result};
use crate::stream::PageDocument;

/// Metadata shown on a film's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilmDetails {
    pub title: String,
    pub plot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonLdMovie {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    director: Option<OneOrMany<Person>>,
    #[serde(default)]
    actor: Option<OneOrMany<Person>>,
    #[serde(default)]
    image: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<String>,
}

/// Parse film details from a detail page.
///
/// JSON-LD blocks that fail to parse are skipped; the first `Movie` wins.
pub fn parse_film_details(html: &str) -> Result<FilmDetails> {
    let document = PageDocument::parse(html);
    let scripts = document.select(r#"script[type="application/ld+json"]"#)?;

    for script in scripts {
        let Some(movie) = parse_json_ld(&script.text()) else { continue };
        if movie.kind.as_deref() != Some("Movie") {
            continue;
        }

        let people = |p: Option<OneOrMany<Person>>| -> Vec<String> {
            p.map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|person| person.name)
                .collect()
        };

        return Ok(FilmDetails {
            title: movie.name,
            plot: movie.description,
            director: people(movie.director).into_iter().next(),
            cast: people(movie.actor),
            thumbnail_url: movie.image.as_ref().and_then(image_url),
        });
    }

    Err(DafilmsError::Parse("no Movie JSON-LD block on page".into()))
}

/// `image` may be a string, a list of strings, or an `ImageObject`.
fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map.get("url").and_then(image_url),
        _ => None,
    }
}

/// Parse a JSON-LD block as is, then with control characters stripped, and
/// only then with typographic quotes turned into JSON quotes. Czech text
/// quotes with „…“, so that rewrite is a last resort.
fn parse_json_ld(raw: &str) -> Option<JsonLdMovie> {
    let attempts = [
        raw.to_string(),
        clean_json_ld(raw, false),
        clean_json_ld(raw, true),
    ];
    let mut last_error = None;
    for text in &attempts {
        match serde_json::from_str(text) {
            Ok(movie) => return Some(movie),
            Err(e) => last_error = Some(e),
        }
    }
    if let Some(e) = last_error {
        tracing::debug!(error = %e, "Skipping unparseable JSON-LD block");
    }
    None
}

/// Strip control characters and dashes the site's CMS leaks into JSON-LD,
/// optionally replacing typographic double quotes.
fn clean_json_ld(raw: &str, rewrite_quotes: bool) -> String {
    let replaced: String = raw
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => None,
            '\u{a0}' => Some(' '),
            '\u{2013}' => Some('-'),
            '\u{201c}' | '\u{201d}' if rewrite_quotes => Some('"'),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_movie_block() {
        let html = r#"
            <script type="application/ld+json">{"@type":"Organization","name":"DAFilms"}</script>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">
            {
              "@type": "Movie",
              "name": "Lesní vrahové",
              "description": "Film o lese a lidech",
              "director": [{"@type":"Person","name":"Jana Nováková"}],
              "actor": [{"name":"A"}, {"name":"B"}, {}],
              "image": {"@type":"ImageObject","url":"https://img.dafilms.cz/1.jpg"}
            }
            </script>"#;
        let details = parse_film_details(html).unwrap();
        assert_eq!(details.title, "Lesní vrahové");
        assert_eq!(details.director.as_deref(), Some("Jana Nováková"));
        assert_eq!(details.cast, ["A", "B"]);
        assert_eq!(details.thumbnail_url.as_deref(), Some("https://img.dafilms.cz/1.jpg"));
    }

    #[test]
    fn single_director_object_and_string_image() {
        let html = r#"<script type="application/ld+json">{"@type":"Movie","name":"X","director":{"name":"D"},"image":"https://i/x.jpg"}</script>"#;
        let details = parse_film_details(html).unwrap();
        assert_eq!(details.director.as_deref(), Some("D"));
        assert!(details.cast.is_empty());
        assert_eq!(details.plot, "");
        assert_eq!(details.thumbnail_url.as_deref(), Some("https://i/x.jpg"));
    }

    #[test]
    fn typographic_quotes_are_cleaned() {
        assert_eq!(clean_json_ld("{\u{201c}a\u{201d}:\n 1}", true), "{\"a\": 1}");
        assert_eq!(clean_json_ld("\u{201e}Les\u{201c}", false), "\u{201e}Les\u{201c}");
    }

    #[test]
    fn czech_quotes_in_description() {
        let html = "<script type=\"application/ld+json\">{\"@type\":\"Movie\",\"name\":\"Les\",\"description\":\"Film \u{201e}Les\u{201c} o lese\"}</script>";
        let details = parse_film_details(html).unwrap();
        assert_eq!(details.plot, "Film \u{201e}Les\u{201c} o lese");
    }

    #[test]
    fn multiline_block_still_parses() {
        let html = "<script type=\"application/ld+json\">{\"@type\":\"Movie\",\"name\":\"Voda\",\"description\":\"first line\nsecond line\"}</script>";
        let details = parse_film_details(html).unwrap();
        assert_eq!(details.plot, "first linesecond line");
    }

    #[test]
    fn missing_movie_is_parse_error() {
        assert!(matches!(
            parse_film_details("<p>nothing</p>"),
            Err(DafilmsError::Parse(_))
        ));
    }
}
