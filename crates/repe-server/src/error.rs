//! Error types for the REPE TCP server

use repe_protocol::ProtocolError;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors surfaced by server lifecycle and handlers
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listening socket
    #[error("Bind failed: {0}")]
    BindFailed(String),

    /// Listen address did not resolve
    #[error("Cannot resolve listen address '{0}'")]
    Resolve(String),

    /// Server is already running
    #[error("Already running")]
    AlreadyRunning,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Handler reported a failure; converted to a PARSE_ERROR response
    #[error("{0}")]
    Handler(String),

    /// I/O error from the socket layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while encoding a response value
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// REPE protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
