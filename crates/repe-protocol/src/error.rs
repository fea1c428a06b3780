//! Error types for protocol encoding and decoding

use crate::ErrorCode;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding REPE wire data
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Header failed framing checks (bad magic, version, or declared length)
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Buffer ended before the structure it should contain
    #[error("Buffer too short: need {needed} bytes, have {have}")]
    ShortBuffer { needed: usize, have: usize },

    /// Header length field disagrees with the query/body sections
    #[error("Declared length {declared} does not match header + sections ({actual})")]
    LengthMismatch { declared: u64, actual: u64 },

    /// Query bytes could not be interpreted
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Body bytes could not be interpreted under the tagged format
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Map this error onto the wire-level error code a peer should see.
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            Self::InvalidHeader(_) | Self::ShortBuffer { .. } | Self::LengthMismatch { .. } => {
                ErrorCode::InvalidHeader
            }
            Self::InvalidQuery(_) => ErrorCode::InvalidQuery,
            Self::InvalidBody(_) => ErrorCode::InvalidBody,
            Self::Json(_) => ErrorCode::ParseError,
        }
    }
}
