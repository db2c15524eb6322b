//! Error types for the graph engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the graph engine.
///
/// Graph construction and execution report failure through boolean returns
/// and leave the program in a resettable state; `EngineError` is reserved
/// for the persistence boundary, where I/O and malformed streams are real
/// error conditions.
#[derive(Debug, Error)]
pub enum EngineError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is malformed (bad framing, length, or encoding)
    #[error("Corrupt stream: {0}")]
    Corrupt(String),

    /// An unknown record code was encountered while loading
    #[error("Unknown record code {0}")]
    UnknownRecord(u8),

    /// A custom value type has no registered decoder
    #[error("No decoder registered for value type '{0}'")]
    UnknownValueType(String),
}

impl EngineError {
    /// Create a corrupt-stream error with a message
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
