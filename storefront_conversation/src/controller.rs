//! Chat session controller.
//!
//! Drives one user interaction end to end: records the user turn, sends the
//! context window to the assistant, parses the reply and records the answer.
//! At most one request is in flight per session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storefront_core::{
    AssistantClient, AssistantReply, AssistantRequest, ContentParser, DisplayMessage, MessageKind,
    Turn,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::ConversationContext;
use crate::history::{HistoryConfig, HistoryStats, HistoryWindow};

/// Shown to the user whenever a request fails.
pub const DEFAULT_APOLOGY: &str = "Xin lỗi, đã có lỗi xảy ra. Vui lòng thử lại sau.";

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Context window policy
    pub history: HistoryConfig,
    /// Fixed message shown when a request fails
    pub apology: String,
    /// Requests taking longer than this resolve as failures
    pub request_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            apology: DEFAULT_APOLOGY.to_string(),
            request_timeout: None,
        }
    }
}

impl ChatConfig {
    #[must_use]
    pub const fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_apology(mut self, apology: String) -> Self {
        self.apology = apology;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("No request in flight for ticket {0}")]
    NoRequestInFlight(u64),
}

/// A request accepted by [`ChatSessionController::begin_submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Identifies the request when completing it.
    pub ticket: u64,
    pub request: AssistantRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was blank; nothing recorded.
    Ignored,
    /// Another request is in flight; nothing recorded.
    Rejected,
    Dispatched(PendingRequest),
}

/// How a full [`ChatSessionController::submit`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Ignored,
    Rejected,
    Answered,
    Failed,
    /// The session was reset while the request was in flight.
    Discarded,
}

/// State machine behind the assistant widget.
pub struct ChatSessionController<C = Arc<dyn AssistantClient>> {
    pub(crate) client: C,
    parser: ContentParser,
    history: HistoryWindow,
    pub(crate) config: ChatConfig,
    context: ConversationContext,
    transcript: Vec<DisplayMessage>,
    in_flight: Option<u64>,
    next_ticket: u64,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<C> ChatSessionController<C>
where
    C: AssistantClient,
{
    pub fn new(client: C, parser: ContentParser, config: ChatConfig) -> Self {
        let now = Utc::now();
        let session_id = Uuid::now_v7();
        info!(
            "Creating chat session {session_id} (endpoint: {})",
            client.endpoint()
        );

        Self {
            client,
            parser,
            history: HistoryWindow::with_config(config.history.clone()),
            config,
            context: ConversationContext::new(),
            transcript: Vec::new(),
            in_flight: None,
            next_ticket: 0,
            session_id,
            started_at: now,
            updated_at: now,
        }
    }

    /// Accept a user submission and build the request for it.
    ///
    /// On acceptance the user message and user turn are recorded immediately
    /// and the session enters [`SessionState::Sending`].
    pub fn begin_submit(&mut self, raw: &str) -> SubmitOutcome {
        let query = raw.trim();
        if query.is_empty() {
            debug!("Ignoring blank submission");
            return SubmitOutcome::Ignored;
        }
        if let Some(ticket) = self.in_flight {
            info!("Rejecting submission while request {ticket} is in flight");
            return SubmitOutcome::Rejected;
        }

        self.push(DisplayMessage::user(query));
        self.context.append(Turn::user(query));

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(ticket);

        let request = AssistantRequest {
            query: query.to_string(),
            context: self.history.select(&self.context),
        };
        info!(
            "Dispatching request {ticket} for session {} with {} context turns",
            self.session_id,
            request.context.len()
        );

        SubmitOutcome::Dispatched(PendingRequest { ticket, request })
    }

    /// Record the outcome of the request identified by `ticket`.
    ///
    /// A successful reply becomes an assistant message and an assistant turn
    /// holding the raw reply. Any failure becomes a single error message and
    /// leaves the context untouched.
    pub fn complete(
        &mut self,
        ticket: u64,
        result: anyhow::Result<AssistantReply>,
    ) -> Result<&DisplayMessage, ControllerError> {
        if self.in_flight != Some(ticket) {
            return Err(ControllerError::NoRequestInFlight(ticket));
        }
        self.in_flight = None;

        let message = match result {
            Ok(reply) if !reply.response.trim().is_empty() => {
                let parsed = self.parser.parse(&reply.response);
                debug!(
                    "Request {ticket} answered: {} lines, {} products",
                    parsed.text.len(),
                    parsed.products.len()
                );
                self.context.append(Turn::assistant(reply.response));
                DisplayMessage::assistant(parsed)
            }
            Ok(_) => {
                warn!("Request {ticket} returned an empty reply");
                DisplayMessage::error(&self.config.apology)
            }
            Err(e) => {
                warn!("Request {ticket} failed: {e:#}");
                DisplayMessage::error(&self.config.apology)
            }
        };

        Ok(self.push(message))
    }

    /// Run one full interaction against the client.
    pub async fn submit(&mut self, raw: &str) -> Submission {
        let pending = match self.begin_submit(raw) {
            SubmitOutcome::Dispatched(pending) => pending,
            SubmitOutcome::Ignored => return Submission::Ignored,
            SubmitOutcome::Rejected => return Submission::Rejected,
        };

        let mut guard = InFlight {
            controller: self,
            ticket: Some(pending.ticket),
        };
        let result = guard.controller.send_pending(&pending).await;
        guard.ticket = None;
        guard.controller.finish(pending.ticket, result)
    }

    /// Send a request accepted by [`Self::begin_submit`].
    ///
    /// Lets a front end render the pending state between dispatch and
    /// [`Self::complete`].
    pub async fn send_pending(&self, pending: &PendingRequest) -> anyhow::Result<AssistantReply> {
        dispatch(&self.client, &pending.request, self.config.request_timeout).await
    }

    pub(crate) fn finish(
        &mut self,
        ticket: u64,
        result: anyhow::Result<AssistantReply>,
    ) -> Submission {
        match self.complete(ticket, result) {
            Ok(message) if message.kind == MessageKind::Error => Submission::Failed,
            Ok(_) => Submission::Answered,
            Err(e) => {
                warn!("Discarding reply: {e}");
                Submission::Discarded
            }
        }
    }

    /// Give up on the request identified by `ticket` without recording a reply.
    ///
    /// The user turn stays in the context. Returns `false` if `ticket` is not
    /// the request in flight.
    pub fn abandon(&mut self, ticket: u64) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        warn!("Request {ticket} abandoned before completion");
        self.in_flight = None;
        true
    }

    /// Forget the transcript and context and start a fresh session.
    pub fn reset(&mut self) {
        info!(
            "Resetting chat session {} ({} messages)",
            self.session_id,
            self.transcript.len()
        );
        self.transcript.clear();
        self.context.clear();
        self.in_flight = None;
        self.session_id = Uuid::now_v7();
        self.started_at = Utc::now();
        self.updated_at = self.started_at;
    }

    #[must_use]
    pub fn transcript(&self) -> &[DisplayMessage] {
        &self.transcript
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::Sending
        } else {
            SessionState::Idle
        }
    }

    /// Whether the loading indicator should be shown.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub const fn context(&self) -> &ConversationContext {
        &self.context
    }

    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::of(&self.context)
    }

    fn push(&mut self, message: DisplayMessage) -> &DisplayMessage {
        self.transcript.push(message);
        self.updated_at = Utc::now();
        &self.transcript[self.transcript.len() - 1]
    }
}

/// Abandons the request in flight if [`ChatSessionController::submit`] is
/// dropped before the reply is recorded.
struct InFlight<'a, C: AssistantClient> {
    controller: &'a mut ChatSessionController<C>,
    ticket: Option<u64>,
}

impl<C: AssistantClient> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.controller.abandon(ticket);
        }
    }
}

/// Send `request`, turning an expired timeout into an error.
pub(crate) async fn dispatch<C>(
    client: &C,
    request: &AssistantRequest,
    timeout: Option<Duration>,
) -> anyhow::Result<AssistantReply>
where
    C: AssistantClient + ?Sized,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, client.send(request))
            .await
            .map_err(|_| anyhow::anyhow!("Request timed out after {limit:?}"))?,
        None => client.send(request).await,
    }
}
