use thiserror::Error;

pub type Result<T> = core::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ChatError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ChatError::Other(anyhow::anyhow!(err.to_string()))
    }
}
