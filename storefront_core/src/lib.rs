#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Core types for the storefront assistant widget.
//!
//! This crate holds the data model shared by the conversation layer and the
//! presentation layer, the [`AssistantClient`] seam used to reach the remote
//! assistant, and the pure [`ContentParser`] that turns a raw reply into a
//! renderable message.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod message;
pub mod parser;

pub use message::{DisplayMessage, MessageKind, ProductRef, TextLine};
pub use parser::{ContentParser, ParsedContent, ParserError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged utterance kept as conversational memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body sent to the assistant backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantRequest {
    pub query: String,
    pub context: Vec<Turn>,
}

/// Reply body returned by the assistant backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantReply {
    pub response: String,
}

#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply>;

    /// Human-readable target, used in logs.
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T> AssistantClient for Arc<T>
where
    T: AssistantClient + ?Sized,
{
    async fn send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        (**self).send(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
