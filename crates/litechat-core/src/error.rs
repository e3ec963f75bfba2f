//! Error types for LiteChat.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No element matched any descriptor of a rule chain (or the wait deadline passed).
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("No conversation turns found on the page")]
    EmptyConversation,

    /// The persisted key-value store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A lookup descriptor could not be compiled.
    #[error("Malformed rule {rule:?}: {reason}")]
    MalformedRule { rule: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
