//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy type with its own input, dispatched
//! statically from `main`.

use std::sync::Arc;

use storefront_config::Config;
use storefront_conversation::ChatSessionController;
use storefront_core::{AssistantClient, ContentParser};
use storefront_providers::{HttpAssistantClient, RetryPolicy};
use tracing::info;

mod ask;
mod chat;
mod info;
mod init;
mod parse;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use parse::{ParseInput, ParseStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type, so
/// parameters are passed without runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Common components shared by the commands that talk to the assistant.
pub(crate) struct ChatComponents {
    pub config: Config,
    pub controller: ChatSessionController,
}

/// Build the HTTP client for the configured (or overridden) endpoint.
fn build_client(config: &Config, endpoint: Option<String>) -> HttpAssistantClient {
    let endpoint = endpoint.unwrap_or_else(|| config.assistant.endpoint.clone());
    let retry = RetryPolicy {
        base_delays: config.assistant.retry.base_delays(),
        final_retries: config.assistant.retry.final_retries,
        final_delay: config.assistant.retry.final_delay(),
    };

    let client = HttpAssistantClient::new(endpoint).with_retry(retry);
    match config.assistant.timeout() {
        Some(timeout) => client.with_timeout(timeout),
        None => client,
    }
}

pub(crate) fn build_parser(config: &Config, base_url: Option<&str>) -> anyhow::Result<ContentParser> {
    let base_url = base_url.unwrap_or(config.catalog.product_base_url.as_str());
    Ok(ContentParser::with_base_url(base_url)?)
}

/// Load config and assemble a chat session against the assistant backend.
pub(crate) fn init_chat_components(endpoint: Option<String>) -> anyhow::Result<ChatComponents> {
    let config = Config::load_or_default()?;

    let client: Arc<dyn AssistantClient> = Arc::new(build_client(&config, endpoint));
    let parser = build_parser(&config, None)?;
    info!(
        "Product links restricted to: {}",
        parser.base_url().unwrap_or("(any origin)")
    );

    let controller = ChatSessionController::new(client, parser, config.chat.to_chat_config());

    Ok(ChatComponents { config, controller })
}
