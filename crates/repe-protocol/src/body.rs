// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Format-tagged body encoding and decoding
//!
//! JSON bodies go through `serde_json`. BEVE is consumed through the
//! [`BinaryValueCodec`] interface and must be injected by the application;
//! this crate never implements the BEVE format itself. UTF8 and RAW_BINARY
//! are handled inline, and custom formats (tag >= 4096) pass through as
//! opaque bytes.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ProtocolError, Result};
use crate::BodyFormat;

/// Narrow interface for an injected binary value codec (BEVE).
pub trait BinaryValueCodec: Send + Sync {
    /// Encode a dynamic value to bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode bytes back to a dynamic value.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// A body value before encoding or after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body section
    Empty,
    /// Structured value (JSON / BEVE)
    Value(Value),
    /// Plain text (UTF8)
    Text(String),
    /// Opaque bytes (RAW_BINARY / custom formats)
    Bytes(Vec<u8>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The structured value, when this body holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The text content, when this body holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Format-dispatching body codec.
///
/// JSON, UTF8, and RAW_BINARY handling is built in; a BEVE codec can be
/// injected with [`BodyCodec::with_beve`]. Cloning is cheap - the injected
/// codec is shared.
#[derive(Clone, Default)]
pub struct BodyCodec {
    beve: Option<Arc<dyn BinaryValueCodec>>,
}

impl BodyCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a BEVE codec implementation.
    pub fn with_beve(mut self, codec: Arc<dyn BinaryValueCodec>) -> Self {
        self.beve = Some(codec);
        self
    }

    fn beve(&self) -> Result<&dyn BinaryValueCodec> {
        self.beve
            .as_deref()
            .ok_or_else(|| ProtocolError::InvalidBody("no BEVE codec registered".to_string()))
    }

    /// Encode a body value under the given format tag.
    pub fn encode(&self, body: &Body, format: BodyFormat) -> Result<Vec<u8>> {
        if body.is_empty() {
            return Ok(Vec::new());
        }
        match format {
            BodyFormat::Json => match body {
                Body::Value(v) => Ok(serde_json::to_vec(v)?),
                Body::Text(s) => Ok(serde_json::to_vec(s)?),
                _ => Err(ProtocolError::InvalidBody(
                    "JSON body requires a structured value".to_string(),
                )),
            },
            BodyFormat::Beve => match body {
                Body::Value(v) => self.beve()?.encode(v),
                Body::Text(s) => self.beve()?.encode(&Value::String(s.clone())),
                _ => Err(ProtocolError::InvalidBody(
                    "BEVE body requires a structured value".to_string(),
                )),
            },
            BodyFormat::Utf8 => match body {
                Body::Text(s) => Ok(s.clone().into_bytes()),
                Body::Value(Value::String(s)) => Ok(s.clone().into_bytes()),
                _ => Err(ProtocolError::InvalidBody(
                    "UTF8 body requires text".to_string(),
                )),
            },
            BodyFormat::RawBinary | BodyFormat::Custom(_) => match body {
                Body::Bytes(b) => Ok(b.clone()),
                _ => Err(ProtocolError::InvalidBody(
                    "RAW_BINARY body requires a byte sequence".to_string(),
                )),
            },
        }
    }

    /// Decode body bytes under the given format tag.
    ///
    /// Empty bytes decode to [`Body::Empty`] for every format.
    pub fn decode(&self, bytes: &[u8], format: BodyFormat) -> Result<Body> {
        if bytes.is_empty() {
            return Ok(Body::Empty);
        }
        match format {
            BodyFormat::Json => Ok(Body::Value(serde_json::from_slice(bytes)?)),
            BodyFormat::Beve => Ok(Body::Value(self.beve()?.decode(bytes)?)),
            BodyFormat::Utf8 => String::from_utf8(bytes.to_vec())
                .map(Body::Text)
                .map_err(|e| ProtocolError::InvalidBody(format!("invalid UTF-8: {}", e))),
            BodyFormat::RawBinary | BodyFormat::Custom(_) => Ok(Body::Bytes(bytes.to_vec())),
        }
    }

    /// Decode body bytes into a named shape. JSON and BEVE only.
    pub fn decode_as<T: DeserializeOwned>(&self, bytes: &[u8], format: BodyFormat) -> Result<T> {
        match format {
            BodyFormat::Json => Ok(serde_json::from_slice(bytes)?),
            BodyFormat::Beve => {
                let value = self.beve()?.decode(bytes)?;
                Ok(serde_json::from_value(value)?)
            }
            other => Err(ProtocolError::InvalidBody(format!(
                "typed decode requires JSON or BEVE, got {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Debug for BodyCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyCodec")
            .field("beve", &self.beve.is_some())
            .finish()
    }
}
