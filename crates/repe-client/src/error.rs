//! Error types for the REPE client

use repe_protocol::ProtocolError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced to callers of [`crate::Client`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No open connection
    #[error("Not connected")]
    NotConnected,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not reach any resolved address
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Hostname did not resolve
    #[error("Cannot resolve '{0}'")]
    Resolve(String),

    /// The request deadline passed before a response arrived
    #[error("Request timed out")]
    Timeout,

    /// The connection closed while a request was outstanding
    #[error("Connection closed")]
    Closed,

    /// The server answered with a non-OK error code
    #[error("RPC Error ({code}): {message}")]
    Rpc { code: u32, message: String },

    /// A spawned request task failed
    #[error("Task failed: {0}")]
    Join(String),

    /// I/O error from the socket layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while decoding a typed response
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// REPE protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
