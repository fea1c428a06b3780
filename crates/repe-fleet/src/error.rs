//! Error types for fleet operations

use repe_client::ClientError;

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

/// Errors raised by fleet construction and per-node calls
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// Node names must be unique at construction
    #[error("Duplicate node name '{0}'")]
    DuplicateNode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Addressed node does not exist
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// Underlying client failure
    #[error(transparent)]
    Client(#[from] ClientError),
}
