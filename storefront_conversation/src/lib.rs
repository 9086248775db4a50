#![warn(
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

//! Conversation state for the storefront assistant widget.
//!
//! # Key Features
//! - Append-only conversation log with a bounded context window
//! - Single-flight request state machine with a fixed apology on failure
//! - Reply parsing into render-ready messages
//! - A shareable session handle for concurrent front ends

mod context;
mod controller;
mod history;
mod shared;

pub use context::ConversationContext;
pub use controller::{
    ChatConfig, ChatSessionController, ControllerError, DEFAULT_APOLOGY, PendingRequest,
    SessionState, SubmitOutcome, Submission,
};
pub use history::{HistoryConfig, HistoryStats, HistoryWindow};
pub use shared::SharedChatSession;
