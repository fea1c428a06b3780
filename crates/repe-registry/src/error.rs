//! Error types for registry operations

use repe_protocol::{ErrorCode, ProtocolError};

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while resolving, reading, writing, or calling entries
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Pointer text violates RFC 6901
    #[error("Invalid pointer '{0}'")]
    InvalidPointer(String),

    /// Missing key, out-of-range index, or unknown field
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Intermediate segment resolved to something that has no children
    #[error("Segment '{0}' cannot be descended into")]
    NotTraversable(String),

    /// Writing at the root requires an object body
    #[error("Writing at the root requires an object body")]
    RootWriteRequiresObject,

    /// Empty paths cannot be registered or set
    #[error("Cannot use the empty path here")]
    EmptyPath,

    /// A callable entry reported a failure
    #[error("Call failed: {0}")]
    Call(String),

    /// Body was not usable for the selected operation
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// REPE protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RegistryError {
    /// Map this error onto the wire-level error code a peer should see.
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPointer(_) => ErrorCode::InvalidQuery,
            Self::NotFound(_) | Self::NotTraversable(_) => ErrorCode::MethodNotFound,
            Self::RootWriteRequiresObject | Self::EmptyPath | Self::InvalidBody(_) => {
                ErrorCode::InvalidBody
            }
            Self::Call(_) => ErrorCode::ParseError,
            Self::Json(_) => ErrorCode::ParseError,
            Self::Protocol(e) => e.wire_code(),
        }
    }
}
