//! Render-ready transcript entries.

use serde::{Deserialize, Serialize};

use crate::parser::{ParsedContent, split_lines};

/// A product mention extracted from an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRef {
    pub display_name: String,
    pub image_url: String,
    /// Numeric identifier taken from the `/product/<id>` link, kept opaque.
    pub target_id: String,
    /// Alt text of the image marker; may be empty.
    #[serde(default)]
    pub alt_text: String,
}

impl ProductRef {
    /// Storefront-relative path of the product detail page.
    #[must_use]
    pub fn detail_path(&self) -> String {
        format!("/product/{}", self.target_id)
    }
}

/// One visual line of narrative text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextLine {
    pub content: String,
    /// Line starts with a bullet marker and should be rendered indented.
    pub bullet: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// A transcript entry handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayMessage {
    pub kind: MessageKind,
    pub text: Vec<TextLine>,
    pub products: Vec<ProductRef>,
}

impl DisplayMessage {
    #[must_use]
    pub fn user(raw: &str) -> Self {
        Self {
            kind: MessageKind::User,
            text: split_lines(raw),
            products: Vec::new(),
        }
    }

    #[must_use]
    pub fn assistant(parsed: ParsedContent) -> Self {
        Self {
            kind: MessageKind::Assistant,
            text: parsed.text,
            products: parsed.products,
        }
    }

    #[must_use]
    pub fn error(apology: &str) -> Self {
        Self {
            kind: MessageKind::Error,
            text: split_lines(apology),
            products: Vec::new(),
        }
    }

    /// Narrative lines joined with `\n`.
    #[must_use]
    pub fn plain_text(&self) -> String {
        join_lines(&self.text)
    }
}

pub(crate) fn join_lines(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|line| line.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
