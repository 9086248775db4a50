//! Cloneable handle to a chat session for concurrent front ends.

use std::sync::Arc;

use storefront_core::{AssistantClient, DisplayMessage};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::controller::{ChatSessionController, SubmitOutcome, Submission, dispatch};

/// Shares one [`ChatSessionController`] between tasks.
///
/// The lock is released while the request is on the wire, so a submission
/// made during that time sees the session as sending and is rejected rather
/// than queued.
pub struct SharedChatSession<C = Arc<dyn AssistantClient>> {
    inner: Arc<Mutex<ChatSessionController<C>>>,
}

impl<C> Clone for SharedChatSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> SharedChatSession<C>
where
    C: AssistantClient + Clone + 'static,
{
    pub fn new(controller: ChatSessionController<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub async fn submit(&self, raw: &str) -> Submission {
        let (pending, client, timeout) = {
            let mut controller = self.inner.lock().await;
            match controller.begin_submit(raw) {
                SubmitOutcome::Dispatched(pending) => (
                    pending,
                    controller.client.clone(),
                    controller.config.request_timeout,
                ),
                SubmitOutcome::Ignored => return Submission::Ignored,
                SubmitOutcome::Rejected => return Submission::Rejected,
            }
        };

        let mut guard = AbandonOnDrop {
            inner: Arc::clone(&self.inner),
            ticket: Some(pending.ticket),
        };
        let result = dispatch(&client, &pending.request, timeout).await;
        let mut controller = self.inner.lock().await;
        guard.ticket = None;
        controller.finish(pending.ticket, result)
    }

    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    pub async fn transcript(&self) -> Vec<DisplayMessage> {
        self.inner.lock().await.transcript().to_vec()
    }

    pub async fn is_pending(&self) -> bool {
        self.inner.lock().await.is_pending()
    }

    /// Direct access for read-heavy callers.
    pub async fn lock(&self) -> MutexGuard<'_, ChatSessionController<C>> {
        self.inner.lock().await
    }
}

/// Releases the session if a [`SharedChatSession::submit`] future is dropped
/// while its request is on the wire.
struct AbandonOnDrop<C: AssistantClient + 'static> {
    inner: Arc<Mutex<ChatSessionController<C>>>,
    ticket: Option<u64>,
}

impl<C: AssistantClient + 'static> Drop for AbandonOnDrop<C> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        if let Ok(mut controller) = self.inner.try_lock() {
            controller.abandon(ticket);
            return;
        }

        // Someone else holds the lock; finish the cleanup on the runtime.
        let inner = Arc::clone(&self.inner);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    inner.lock().await.abandon(ticket);
                });
            }
            Err(_) => warn!("Request {ticket} abandoned outside a runtime; session stays pending"),
        }
    }
}
