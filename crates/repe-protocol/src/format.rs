//! Query and body format tags
//!
//! Both tags are carried as `u16` fields in the header. Values at or above
//! 4096 are user-defined; the stack passes their payloads through opaquely.

use serde::{Deserialize, Serialize};

/// Interpretation of the query section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryFormat {
    /// Uninterpreted bytes
    RawBinary,
    /// UTF-8 JSON Pointer path (the common case)
    JsonPointer,
    /// User-defined format (>= 4096)
    Custom(u16),
}

impl QueryFormat {
    pub const CUSTOM_BASE: u16 = 4096;
}

impl From<u16> for QueryFormat {
    fn from(tag: u16) -> Self {
        match tag {
            0 => Self::RawBinary,
            1 => Self::JsonPointer,
            n => Self::Custom(n),
        }
    }
}

impl From<QueryFormat> for u16 {
    fn from(format: QueryFormat) -> Self {
        match format {
            QueryFormat::RawBinary => 0,
            QueryFormat::JsonPointer => 1,
            QueryFormat::Custom(n) => n,
        }
    }
}

/// Interpretation of the body section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyFormat {
    /// Uninterpreted bytes
    RawBinary,
    /// BEVE binary encoding (via an injected codec)
    Beve,
    /// JSON text
    Json,
    /// Plain UTF-8 text
    Utf8,
    /// User-defined format (>= 4096)
    Custom(u16),
}

impl BodyFormat {
    pub const CUSTOM_BASE: u16 = 4096;
}

impl From<u16> for BodyFormat {
    fn from(tag: u16) -> Self {
        match tag {
            0 => Self::RawBinary,
            1 => Self::Beve,
            2 => Self::Json,
            3 => Self::Utf8,
            n => Self::Custom(n),
        }
    }
}

impl From<BodyFormat> for u16 {
    fn from(format: BodyFormat) -> Self {
        match format {
            BodyFormat::RawBinary => 0,
            BodyFormat::Beve => 1,
            BodyFormat::Json => 2,
            BodyFormat::Utf8 => 3,
            BodyFormat::Custom(n) => n,
        }
    }
}
