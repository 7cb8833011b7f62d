//! Error types for agentsim-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidStateTransition(String, String),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("A response is already pending for session {0}")]
    ResponsePending(String),

    #[error("Pricing service unavailable: {0}")]
    PricingUnavailable(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
