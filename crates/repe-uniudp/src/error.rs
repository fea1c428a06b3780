//! Error types for the UniUDP transport

use repe_protocol::ProtocolError;

/// Result type alias for UniUDP operations
pub type Result<T> = std::result::Result<T, UniUdpError>;

/// Errors surfaced by UniUDP sending, receiving, and serving
#[derive(Debug, thiserror::Error)]
pub enum UniUdpError {
    /// Datagram failed packet-level validation
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// Caller-supplied parameter out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No complete message arrived within the overall deadline
    #[error("Timed out waiting for a complete message")]
    Timeout,

    /// Server loop is already running
    #[error("Already running")]
    AlreadyRunning,

    /// Handler reported a failure
    #[error("Handler error: {0}")]
    Handler(String),

    /// I/O error from the socket layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// REPE protocol error while framing or parsing payloads
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
