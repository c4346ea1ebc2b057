//! Typed view over a parsed HTML page.
//!
//! Wraps [`scraper::Html`] so extraction code asks for tags, attributes and
//! inline scripts through explicit accessors instead of walking the DOM ad hoc.
//! Parsing is html5ever's error-recovering parser: any input yields a tree.

use scraper::{ElementRef, Html, Selector};

use crate::error::{DafilmsError, Result};

/// A parsed page.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Elements matching a CSS selector, in document order.
    pub fn select(&self, css: &str) -> Result<Vec<Node<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).map(Node).collect())
    }

    /// Every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = Node<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(Node)
    }

    /// Text of every `<script>` without a `src`, in document order.
    pub fn inline_scripts(&self) -> Vec<String> {
        self.elements()
            .filter(|n| n.is("script") && n.attr("src").is_none())
            .map(|n| n.text())
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Number of `<script>` elements, inline or external.
    pub fn script_count(&self) -> usize {
        self.elements().filter(|n| n.is("script")).count()
    }
}

/// An element of a [`PageDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Lowercase tag name.
    pub fn tag_name(&self) -> &'a str {
        self.0.value().name()
    }

    /// Case-insensitive tag-name match.
    pub fn is(&self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }

    /// Attribute value, `None` when absent or blank.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name).filter(|v| !v.trim().is_empty())
    }

    /// All attributes as `(name, value)` pairs.
    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0.value().attrs()
    }

    /// Concatenated descendant text.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    /// Descendant text with whitespace collapsed.
    pub fn text_trimmed(&self) -> String {
        self.0.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
    }

    /// Descendants matching a CSS selector.
    pub fn select(&self, css: &str) -> Result<Vec<Node<'a>>> {
        let selector = parse_selector(css)?;
        Ok(self.0.select(&selector).map(Node).collect())
    }

    /// Nearest ancestor element with the given tag.
    pub fn ancestor(&self, tag: &str) -> Option<Node<'a>> {
        self.0
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(Node)
            .find(|n| n.is(tag))
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DafilmsError::Parse(format!("bad selector {css:?}: {e:?}")))
}
