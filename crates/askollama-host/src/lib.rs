use std::sync::Arc;

use askollama_types::SettingsSnapshot;

mod bus;
mod client;
mod ws;

pub use bus::{EventBus, SubscriptionHandle};
pub use client::HttpHostClient;
pub use ws::WsEventSource;

/// Callback invoked once per delivered event payload
pub type EventHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Request/response interface of the host process
#[async_trait::async_trait]
pub trait HostCommandService: Send + Sync {
    /// Ask the model to explain `ocr_text` with the user's follow-up prompt
    async fn explain_with_prompt(&self, ocr_text: &str, prompt: &str)
    -> Result<String, CommandError>;

    async fn save_settings(&self) -> Result<(), CommandError>;

    async fn load_settings(&self) -> Result<SettingsSnapshot, CommandError>;

    /// Register the app to start with the session, returning the created entry's path
    async fn enable_autostart(&self) -> Result<String, CommandError>;

    async fn disable_autostart(&self) -> Result<(), CommandError>;
}

/// Push-style notifications from the host process
pub trait EventSource: Send + Sync {
    fn subscribe(
        &self,
        channel: &str,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, SubscriptionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("unknown event channel: {0}")]
    UnknownChannel(String),

    #[error("host unreachable: {0}")]
    HostUnreachable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Failure reported by the host itself
    #[error("{0}")]
    Host(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed host response: {0}")]
    Decode(String),

    #[error("host returned no result for {0}")]
    EmptyResult(&'static str),
}
