//! Assistant reply parsing.
//!
//! The assistant backend embeds product cards in its replies as three
//! consecutive lines:
//!
//! ```text
//! ![alt](https://cdn.example/shirt.jpg)
//! Áo sơ mi trắng
//! [Xem chi tiết](http://localhost:3000/product/42)
//! ```
//!
//! [`ContentParser`] pulls every such block out of the reply and returns the
//! remaining narrative as render-ready lines. Parsing never fails: anything
//! that does not form a complete block stays in the narrative untouched.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::message::{ProductRef, TextLine, join_lines};

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid product link pattern: {0}")]
    InvalidPattern(String),
}

static IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();
static BULLET_PATTERN: OnceLock<Regex> = OnceLock::new();
static LIST_MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();
static ANY_ORIGIN_LINK: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn image_pattern() -> &'static Regex {
    IMAGE_PATTERN.get_or_init(|| {
        Regex::new(r"^!\[([^\]\n]*)\]\(([^()\s]+)\)$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn bullet_pattern() -> &'static Regex {
    BULLET_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[-*+]\s+|•\s*)").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Bullets plus numbered markers such as `1.` or `2)`.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn list_marker_pattern() -> &'static Regex {
    LIST_MARKER_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[-*+]\s+|•\s*|\d+[.)]\s+)")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn any_origin_link() -> &'static Regex {
    ANY_ORIGIN_LINK.get_or_init(|| {
        Regex::new(r"/product/(\d+)\b").expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Result of parsing one assistant reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedContent {
    pub text: Vec<TextLine>,
    pub products: Vec<ProductRef>,
}

impl ParsedContent {
    /// Narrative lines joined with `\n`.
    #[must_use]
    pub fn plain_text(&self) -> String {
        join_lines(&self.text)
    }
}

/// Extracts product reference blocks from raw assistant replies.
#[derive(Debug, Clone)]
pub struct ContentParser {
    link: Regex,
    base_url: Option<String>,
}

impl ContentParser {
    /// Parser accepting product links on any origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            link: any_origin_link().clone(),
            base_url: None,
        }
    }

    /// Parser accepting only links under `base_url` (e.g. `http://localhost:3000`).
    ///
    /// A blank base URL behaves like [`ContentParser::new`].
    pub fn with_base_url(base_url: &str) -> Result<Self, ParserError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Ok(Self::new());
        }

        let pattern = format!(r"{}/product/(\d+)\b", regex::escape(base));
        let link = Regex::new(&pattern).map_err(|e| ParserError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            link,
            base_url: Some(base.to_string()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Split `raw` into product references and narrative lines.
    #[must_use]
    pub fn parse(&self, raw: &str) -> ParsedContent {
        // Positions index the non-blank lines of `raw` and survive every pass.
        let mut remaining: Vec<(usize, &str)> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .collect();
        let mut found: Vec<(usize, ProductRef)> = Vec::new();

        // Removing a block can make the lines around it adjacent, so repeat
        // until the residue holds no block at all.
        loop {
            let (residue, products) = self.extract_pass(&remaining);
            if products.is_empty() {
                break;
            }
            found.extend(products);
            remaining = residue;
        }

        found.sort_by_key(|(position, _)| *position);

        ParsedContent {
            text: remaining.into_iter().map(|(_, line)| text_line(line)).collect(),
            products: found.into_iter().map(|(_, product)| product).collect(),
        }
    }

    fn extract_pass<'a>(
        &self,
        lines: &[(usize, &'a str)],
    ) -> (Vec<(usize, &'a str)>, Vec<(usize, ProductRef)>) {
        let mut residue = Vec::with_capacity(lines.len());
        let mut products = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if let Some(product) = lines.get(i..i + 3).and_then(|block| self.match_block(block)) {
                products.push((lines[i].0, product));
                i += 3;
            } else {
                residue.push(lines[i]);
                i += 1;
            }
        }

        (residue, products)
    }

    fn match_block(&self, block: &[(usize, &str)]) -> Option<ProductRef> {
        let [(position, image), (_, name), (_, link)] = block else {
            return None;
        };
        let (alt_text, image_url) = image_marker(image)?;

        let Some(display_name) = self.name_line(name) else {
            debug!("Skipping product block at line {position}: missing name line");
            return None;
        };
        let Some(target_id) = self.target_id(link) else {
            debug!("Skipping product block at line {position}: missing product link");
            return None;
        };

        Some(ProductRef {
            display_name,
            image_url,
            target_id,
            alt_text,
        })
    }

    fn name_line(&self, line: &str) -> Option<String> {
        if image_marker(line).is_some() || self.link.is_match(line) {
            return None;
        }
        let name = strip_emphasis(strip_list_marker(line).trim()).trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    fn target_id(&self, line: &str) -> Option<String> {
        self.link
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str().to_string())
    }
}

impl Default for ContentParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split free text into trimmed, non-blank lines tagged with bullet hints.
#[must_use]
pub fn split_lines(raw: &str) -> Vec<TextLine> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(text_line)
        .collect()
}

fn text_line(line: &str) -> TextLine {
    TextLine {
        content: line.to_string(),
        bullet: bullet_pattern().is_match(line),
    }
}

/// `(alt, url)` of a line that is exactly one image marker.
fn image_marker(line: &str) -> Option<(String, String)> {
    let caps = image_pattern().captures(strip_list_marker(line).trim())?;
    let alt = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
    let url = caps.get(2)?.as_str().to_string();
    Some((alt, url))
}

fn strip_list_marker(line: &str) -> &str {
    list_marker_pattern()
        .find(line)
        .map_or(line, |marker| &line[marker.end()..])
}

fn strip_emphasis(name: &str) -> &str {
    for marker in ["**", "__"] {
        if let Some(inner) = name
            .strip_prefix(marker)
            .and_then(|rest| rest.strip_suffix(marker))
        {
            return inner;
        }
    }
    name
}
