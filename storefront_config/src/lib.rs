mod schema;

pub use schema::{AssistantConfig, CatalogConfig, ChatSettings, Config, RetryConfig};
