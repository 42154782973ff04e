// errors.rs

use thiserror::Error;

/// Errors surfaced by the data layer: transport failures, structured
/// server rejections, and local persistence problems.
///
/// A response discarded by the fencing rule is *not* an error; it is
/// dropped silently and never reaches callers.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No response received (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status and a message.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The local key-value store failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        ClientError::Network(err.to_string())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        ClientError::Storage(err.to_string())
    }
}
