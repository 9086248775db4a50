use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use storefront_core::{AssistantClient, AssistantReply, AssistantRequest};
use tracing::{debug, info};

use crate::retry::{RetryPolicy, retry_with_backoff};

/// Talks to the storefront assistant backend over HTTP.
///
/// Posts `{"query", "context"}` as JSON and expects `{"response"}` back.
pub struct HttpAssistantClient {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl HttpAssistantClient {
    pub fn new(endpoint: String) -> Self {
        info!("Creating HttpAssistantClient for {endpoint}");
        Self {
            client: Client::new(),
            endpoint,
            retry: RetryPolicy::none(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Helper method to send a single request
    async fn try_send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let body = builder
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        decode_reply(&body)
    }
}

/// Extract the reply from a backend response body.
pub fn decode_reply(body: &serde_json::Value) -> anyhow::Result<AssistantReply> {
    let response = body["response"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing response"))?
        .to_string();

    Ok(AssistantReply { response })
}

/// Transport failures and 5xx statuses are worth another attempt. Client
/// errors and bodies that do not decode are not.
fn is_transient(error: &anyhow::Error) -> bool {
    let Some(error) = error.downcast_ref::<reqwest::Error>() else {
        return false;
    };
    if error.is_decode() {
        return false;
    }
    error.status().is_none_or(|status| status.is_server_error())
}

#[async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn send(&self, request: &AssistantRequest) -> anyhow::Result<AssistantReply> {
        debug!(
            "Sending request to {}: query_len={}, context_turns={}",
            self.endpoint,
            request.query.len(),
            request.context.len()
        );

        let reply =
            retry_with_backoff(|| self.try_send(request), &self.retry, is_transient).await?;

        info!("Received reply from {} ({} bytes)", self.endpoint, reply.response.len());
        Ok(reply)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
