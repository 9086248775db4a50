use storefront_config::Config;

/// Strategy for displaying configuration information.
///
/// Outputs the effective configuration: assistant endpoint and timeouts,
/// retry policy, context window, and product link origin.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::config_path()?;
        let config = Config::load_or_default()?;

        println!("=== storefront Configuration ===\n");
        println!(
            "Config file: {}{}",
            path.display(),
            if path.exists() { "" } else { " (not found, using defaults)" }
        );
        println!();

        println!("Assistant:");
        println!("  Endpoint: {}", config.assistant.endpoint);
        match config.assistant.timeout_secs {
            Some(secs) => println!("  Timeout: {secs}s per attempt"),
            None => println!("  Timeout: (none)"),
        }
        let retry = &config.assistant.retry;
        if retry.base_delays_ms.is_empty() && retry.final_retries == 0 {
            println!("  Retry: disabled");
        } else {
            println!(
                "  Retry: backoff {:?}ms, then {} x {}ms",
                retry.base_delays_ms, retry.final_retries, retry.final_delay_ms
            );
        }
        println!();

        println!("Chat:");
        println!("  Context Window: {} turns", config.chat.history.max_turns);
        if let Some(max_chars) = config.chat.history.max_chars {
            println!("  Context Char Limit: {max_chars}");
        }
        if let Some(secs) = config.chat.request_timeout_secs {
            println!("  Request Timeout: {secs}s");
        }
        println!("  Apology: {}", truncate(&config.chat.apology, 60));
        println!();

        println!("Catalog:");
        let base_url = &config.catalog.product_base_url;
        if base_url.trim().is_empty() {
            println!("  Product Links: (any origin)");
        } else {
            println!("  Product Links: {base_url}/product/<id>");
        }

        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
