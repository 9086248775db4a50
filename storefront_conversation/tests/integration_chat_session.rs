//! Integration tests for the chat session state machine.
//!
//! These tests verify that:
//! - Replies are parsed into products while the raw reply is remembered
//! - Only the configured context window travels with each request
//! - Failures and timeouts surface as one apology message
//! - A second submission during a request is rejected
//! - An aborted submission does not leave the session pending

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use storefront_conversation::{
    ChatConfig, ChatSessionController, DEFAULT_APOLOGY, HistoryConfig, SessionState,
    SharedChatSession, SubmitOutcome, Submission,
};
use storefront_core::{
    AssistantClient, AssistantReply, AssistantRequest, ContentParser, MessageKind, Role, Turn,
};
use tokio::sync::{Mutex, Notify};

const PRODUCT_REPLY: &str = "Shop gợi ý cho bạn:\n\
![Áo sơ mi trắng](http://x/img.jpg)\n\
Áo sơ mi trắng\n\
[Xem chi tiết](http://localhost:3000/product/42)\n\
Bạn có thể tham khảo thêm";

/// Replies with a fixed text and remembers every request.
#[derive(Clone, Default)]
struct RecordingClient {
    reply: String,
    requests: Arc<Mutex<Vec<AssistantRequest>>>,
}

impl RecordingClient {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Arc::default(),
        }
    }
}

#[async_trait]
impl AssistantClient for RecordingClient {
    async fn send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        self.requests.lock().await.push(request.clone());
        Ok(AssistantReply {
            response: self.reply.clone(),
        })
    }

    fn endpoint(&self) -> &str {
        "recording"
    }
}

struct FailingClient;

#[async_trait]
impl AssistantClient for FailingClient {
    async fn send(&self, _request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        anyhow::bail!("connection refused")
    }

    fn endpoint(&self) -> &str {
        "failing"
    }
}

/// Blocks every request until the gate is opened.
#[derive(Clone, Default)]
struct GatedClient {
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AssistantClient for GatedClient {
    async fn send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(AssistantReply {
            response: format!("Đã nhận: {}", request.query),
        })
    }

    fn endpoint(&self) -> &str {
        "gated"
    }
}

struct SlowClient;

#[async_trait]
impl AssistantClient for SlowClient {
    async fn send(&self, _request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(AssistantReply {
            response: "quá muộn".to_string(),
        })
    }

    fn endpoint(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_reply_with_product_block() {
    let client = RecordingClient::replying(PRODUCT_REPLY);
    let mut chat = ChatSessionController::new(client, ContentParser::new(), ChatConfig::default());

    assert_eq!(chat.submit("Có áo sơ mi không?").await, Submission::Answered);

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].kind, MessageKind::User);

    let answer = &transcript[1];
    assert_eq!(answer.kind, MessageKind::Assistant);
    assert_eq!(answer.products.len(), 1);
    assert_eq!(answer.products[0].display_name, "Áo sơ mi trắng");
    assert_eq!(answer.products[0].image_url, "http://x/img.jpg");
    assert_eq!(answer.products[0].target_id, "42");
    assert_eq!(
        answer.plain_text(),
        "Shop gợi ý cho bạn:\nBạn có thể tham khảo thêm"
    );

    // The assistant turn keeps what the assistant actually said.
    assert_eq!(chat.context().last(), Some(&Turn::assistant(PRODUCT_REPLY)));
}

#[tokio::test]
async fn test_context_window_sent_with_each_request() {
    let client = RecordingClient::replying("Dạ vâng");
    let requests = Arc::clone(&client.requests);
    let mut chat = ChatSessionController::new(client, ContentParser::new(), ChatConfig::default());

    for i in 0..4 {
        assert_eq!(chat.submit(&format!("câu hỏi {i}")).await, Submission::Answered);
    }

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 4);

    // First request only knows about itself.
    assert_eq!(requests[0].context, vec![Turn::user("câu hỏi 0")]);

    // Fourth request: 7 turns logged, last 5 sent, oldest first.
    let last = &requests[3];
    assert_eq!(last.query, "câu hỏi 3");
    assert_eq!(last.context.len(), 5);
    assert_eq!(last.context[0], Turn::user("câu hỏi 1"));
    assert_eq!(last.context[1], Turn::assistant("Dạ vâng"));
    assert_eq!(last.context[4], Turn::user("câu hỏi 3"));
    assert_eq!(chat.context().len(), 8);
}

#[tokio::test]
async fn test_custom_window_size() {
    let client = RecordingClient::replying("ok");
    let requests = Arc::clone(&client.requests);
    let config = ChatConfig::default().with_history(HistoryConfig::default().with_max_turns(2));
    let mut chat = ChatSessionController::new(client, ContentParser::new(), config);

    chat.submit("một").await;
    chat.submit("hai").await;

    let requests = requests.lock().await;
    assert_eq!(
        requests[1].context,
        vec![Turn::assistant("ok"), Turn::user("hai")]
    );
}

#[tokio::test]
async fn test_failed_send_appends_one_error_message() {
    let mut chat =
        ChatSessionController::new(FailingClient, ContentParser::new(), ChatConfig::default());

    assert_eq!(chat.submit("alo").await, Submission::Failed);
    let context_before = chat.context().len();
    let transcript_before = chat.transcript().len();

    assert_eq!(chat.submit("còn đó không?").await, Submission::Failed);

    // Only the user turn is remembered for the failed exchange.
    assert_eq!(chat.context().len(), context_before + 1);
    assert!(chat.context().turns().iter().all(|t| t.role == Role::User));

    let new_messages = &chat.transcript()[transcript_before..];
    assert_eq!(new_messages.len(), 2);
    assert_eq!(new_messages[0].kind, MessageKind::User);
    assert_eq!(new_messages[1].kind, MessageKind::Error);
    assert_eq!(new_messages[1].plain_text(), DEFAULT_APOLOGY);
    assert!(new_messages[1].products.is_empty());
    assert_eq!(chat.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_timeout_resolves_as_failure() {
    let config = ChatConfig::default()
        .with_apology("Hết thời gian chờ".to_string())
        .with_request_timeout(Duration::from_millis(20));
    let mut chat = ChatSessionController::new(SlowClient, ContentParser::new(), config);

    assert_eq!(chat.submit("alo").await, Submission::Failed);
    assert_eq!(chat.transcript()[1].plain_text(), "Hết thời gian chờ");
    assert_eq!(chat.context().len(), 1);
    assert!(!chat.is_pending());
}

#[tokio::test]
async fn test_concurrent_submission_is_rejected() {
    let client = GatedClient::default();
    let gate = Arc::clone(&client.gate);
    let calls = Arc::clone(&client.calls);
    let session = SharedChatSession::new(ChatSessionController::new(
        client,
        ContentParser::new(),
        ChatConfig::default(),
    ));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("áo sơ mi").await }
    });

    while !session.is_pending().await {
        tokio::task::yield_now().await;
    }

    assert_eq!(session.submit("quần jean").await, Submission::Rejected);
    assert_eq!(session.submit("   ").await, Submission::Ignored);

    gate.notify_one();
    assert_eq!(first.await.ok(), Some(Submission::Answered));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].plain_text(), "áo sơ mi");
    assert_eq!(transcript[1].plain_text(), "Đã nhận: áo sơ mi");
    assert_eq!(session.lock().await.context().len(), 2);
}

#[tokio::test]
async fn test_reset_during_request_discards_reply() {
    let client = GatedClient::default();
    let gate = Arc::clone(&client.gate);
    let session = SharedChatSession::new(ChatSessionController::new(
        client,
        ContentParser::new(),
        ChatConfig::default(),
    ));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("áo sơ mi").await }
    });

    while !session.is_pending().await {
        tokio::task::yield_now().await;
    }

    session.reset().await;
    assert!(!session.is_pending().await);

    gate.notify_one();
    assert_eq!(first.await.ok(), Some(Submission::Discarded));
    assert!(session.transcript().await.is_empty());
    assert!(session.lock().await.context().is_empty());
}

#[tokio::test]
async fn test_aborted_submission_releases_session() {
    let client = GatedClient::default();
    let calls = Arc::clone(&client.calls);
    let session = SharedChatSession::new(ChatSessionController::new(
        client,
        ContentParser::new(),
        ChatConfig::default(),
    ));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("áo").await }
    });

    while !session.is_pending().await {
        tokio::task::yield_now().await;
    }

    first.abort();
    assert!(first.await.is_err_and(|e| e.is_cancelled()));

    assert!(!session.is_pending().await);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut chat = session.lock().await;
    assert_eq!(chat.transcript().len(), 1);
    assert!(matches!(
        chat.begin_submit("quần jean"),
        SubmitOutcome::Dispatched(_)
    ));
}
