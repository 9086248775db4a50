use std::io::Read;
use std::path::PathBuf;

use storefront_config::Config;
use storefront_core::DisplayMessage;
use tracing::debug;

use super::build_parser;
use crate::render;

/// Input parameters for the Parse command strategy.
#[derive(Debug, Clone)]
pub struct ParseInput {
    /// File holding the raw reply; stdin when `None`
    pub file: Option<PathBuf>,
    /// Emit JSON instead of rendered text
    pub json: bool,
    /// Optional product base URL override
    pub base_url: Option<String>,
}

/// Strategy for parsing a raw assistant reply offline.
///
/// Useful for checking what the widget will show for a given backend reply.
#[derive(Debug, Clone, Copy)]
pub struct ParseStrategy;

impl super::CommandStrategy for ParseStrategy {
    type Input = ParseInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;
        let parser = build_parser(&config, input.base_url.as_deref())?;

        let raw = match &input.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };
        debug!("Parsing {} bytes", raw.len());

        let parsed = parser.parse(&raw);

        if input.json {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        } else {
            let message = DisplayMessage::assistant(parsed);
            println!("{}", render::render_message(&message, parser.base_url())?);
        }
        Ok(())
    }
}
