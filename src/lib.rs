pub use crate::chat::{
    ChatMessage, ChatSession, ConnectionStatus, SessionConfig, SessionUpdate,
};
pub use crate::error::{ChatError, Result};

use std::sync::{Mutex, OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

pub mod api;
pub mod chat;
mod error;

const DEFAULT_API_URL: &str = "http://localhost:8000";

static TRACING_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber. Safe to call more than once; only
/// the first call has any effect.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

        TRACING_GUARD.set(Mutex::new(Some(stdout_guard))).ok();

        let stdout_layer = Layer::new()
            .with_writer(non_blocking_stdout)
            .with_ansi(true)
            .with_target(true);

        Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(stdout_layer)
            .init();
    });
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Base URL of the Learnify REST backend
    pub api_base_url: String,
}

impl ChatConfig {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a configuration from the environment.
    ///
    /// Reads `LEARNIFY_API_URL` (a `.env` file is honored if present) and
    /// falls back to the local development backend.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("LEARNIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    /// WebSocket endpoint for a group's live chat channel.
    ///
    /// The channel lives on the same host as the REST backend; only the
    /// scheme changes (`http` becomes `ws`, `https` becomes `wss`).
    pub fn ws_endpoint(&self, group_id: &str) -> Result<String> {
        let ws_base = if let Some(rest) = self.api_base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.api_base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(ChatError::Configuration(format!(
                "unsupported API base URL: {}",
                self.api_base_url
            )));
        };

        Ok(format!("{}/study-groups/ws/{}", ws_base, group_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = ChatConfig::new("http://localhost:8000/");
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_ws_endpoint_swaps_scheme() {
        let config = ChatConfig::new("http://localhost:8000");
        assert_eq!(
            config.ws_endpoint("g1").unwrap(),
            "ws://localhost:8000/study-groups/ws/g1"
        );

        let config = ChatConfig::new("https://learnify.example.com");
        assert_eq!(
            config.ws_endpoint("g1").unwrap(),
            "wss://learnify.example.com/study-groups/ws/g1"
        );
    }

    #[test]
    fn test_ws_endpoint_rejects_unknown_scheme() {
        let config = ChatConfig::new("ftp://localhost:8000");
        let result = config.ws_endpoint("g1");
        assert!(matches!(result, Err(ChatError::Configuration(_))));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
