//! Client error types.

use thiserror::Error;

use meetwise_protocol::ErrorResponse;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to connect to the daemon.
    #[error("connection error: {0}")]
    Connection(String),

    /// An operation timed out.
    #[error("timeout while {0}")]
    Timeout(String),

    /// Protocol-level failure (framing, serialization).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// The daemon answered with an error response.
    #[error("{0}")]
    Server(ErrorResponse),
}
