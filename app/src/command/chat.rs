//! Interactive chat command.
//!
//! Reads one message per line from stdin and renders the transcript as it
//! grows. `/reset` starts a fresh session.

use std::io::Write;

use storefront_conversation::SubmitOutcome;
use tracing::info;

use super::init_chat_components;
use crate::render;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional endpoint override
    pub endpoint: Option<String>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let components = init_chat_components(input.endpoint)?;
        let base_url = components.config.catalog.product_base_url;
        let mut chat = components.controller;

        println!(
            "=== Storefront assistant (session {}, started {}) ===",
            chat.session_id(),
            chat.started_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("Type '/reset' to start over, 'exit' to quit.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let input = line.trim();

            if matches!(input, "exit" | "quit" | "q" | "/exit") {
                break;
            }
            if input == "/reset" {
                chat.reset();
                println!("(new session {})\n", chat.session_id());
                continue;
            }

            let pending = match chat.begin_submit(input) {
                SubmitOutcome::Dispatched(pending) => pending,
                SubmitOutcome::Ignored | SubmitOutcome::Rejected => continue,
            };

            if chat.is_pending() {
                println!("{}", render::PENDING_INDICATOR);
            }

            let result = chat.send_pending(&pending).await;
            let message = chat.complete(pending.ticket, result)?;
            println!("\n{}\n", render::render_message(message, Some(&base_url))?);
        }

        let stats = chat.stats();
        let elapsed = chat.updated_at() - chat.started_at();
        info!(
            "Conversation ended: {} turns ({} user, {} assistant) over {}s",
            stats.total_turns,
            stats.user_turns,
            stats.assistant_turns,
            elapsed.num_seconds()
        );
        Ok(())
    }
}
