//! Context error types.
//!
//! Malformed stored values never surface here; they are normalized to empty values
//! by [`crate::MemoryContext`]. What does surface is backend I/O failure and misuse
//! of the state registry.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
