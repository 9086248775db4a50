use storefront_conversation::Submission;

use super::init_chat_components;
use crate::render;

/// Input parameters for the Ask command strategy.
#[derive(Debug, Clone)]
pub struct AskInput {
    /// Message to send
    pub message: String,
    /// Optional endpoint override
    pub endpoint: Option<String>,
}

/// Strategy for a single question/answer exchange.
///
/// Prints the rendered reply; a failed request is rendered as the apology
/// and reported as an error exit.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let components = init_chat_components(input.endpoint)?;
        let base_url = components.config.catalog.product_base_url;
        let mut chat = components.controller;

        let outcome = chat.submit(&input.message).await;
        if outcome == Submission::Ignored {
            anyhow::bail!("Message is empty");
        }

        if let Some(message) = chat.transcript().last() {
            println!("{}", render::render_message(message, Some(&base_url))?);
        }

        if outcome == Submission::Failed {
            anyhow::bail!("Assistant request failed");
        }
        Ok(())
    }
}
