use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TootstatsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mastodon API error: {0}")]
    Mastodon(#[from] MastodonError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MastodonError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl MastodonError {
    /// Raw response body returned by the server, if the request got that far
    pub fn response_body(&self) -> Option<&str> {
        match self {
            MastodonError::Api { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            MastodonError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
