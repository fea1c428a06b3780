// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! REPE message framing
//!
//! A message is the fixed header followed by the query and body sections.
//! Constructors compute the section lengths; [`Message::new`] refuses
//! headers that disagree with the sections they frame.

use crate::body::{Body, BodyCodec};
use crate::error::{ProtocolError, Result};
use crate::header::{Header, HEADER_LENGTH};
use crate::{BodyFormat, ErrorCode, QueryFormat};

use serde::de::DeserializeOwned;

/// A complete REPE message: header plus query and body sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: Header,
    pub query: Vec<u8>,
    pub body: Vec<u8>,
}

impl Message {
    /// Assemble a message from parts, refusing mismatched section lengths.
    pub fn new(header: Header, query: Vec<u8>, body: Vec<u8>) -> Result<Self> {
        if header.query_length != query.len() as u64 || header.body_length != body.len() as u64 {
            return Err(ProtocolError::LengthMismatch {
                declared: header.length,
                actual: HEADER_LENGTH as u64 + query.len() as u64 + body.len() as u64,
            });
        }
        let expected = HEADER_LENGTH as u64 + header.query_length + header.body_length;
        if header.length != expected {
            return Err(ProtocolError::LengthMismatch {
                declared: header.length,
                actual: expected,
            });
        }
        Ok(Self {
            header,
            query,
            body,
        })
    }

    fn build(
        id: u64,
        query: Vec<u8>,
        body: Vec<u8>,
        query_format: QueryFormat,
        body_format: BodyFormat,
        notify: bool,
        ec: ErrorCode,
    ) -> Self {
        let mut header = Header::new(id, query.len() as u64, body.len() as u64);
        header.query_format = query_format;
        header.body_format = body_format;
        header.notify = notify as u8;
        header.ec = ec;
        Self {
            header,
            query,
            body,
        }
    }

    /// A request expecting a response. The query is a method path.
    pub fn request(id: u64, method: &str, body: Vec<u8>, body_format: BodyFormat) -> Self {
        Self::build(
            id,
            method.as_bytes().to_vec(),
            body,
            QueryFormat::JsonPointer,
            body_format,
            false,
            ErrorCode::Ok,
        )
    }

    /// A notification: the server must not transmit a response.
    pub fn notify(id: u64, method: &str, body: Vec<u8>, body_format: BodyFormat) -> Self {
        Self::build(
            id,
            method.as_bytes().to_vec(),
            body,
            QueryFormat::JsonPointer,
            body_format,
            true,
            ErrorCode::Ok,
        )
    }

    /// A request whose body is encoded from a value through the body codec.
    pub fn request_value(
        id: u64,
        method: &str,
        value: &Body,
        body_format: BodyFormat,
        codec: &BodyCodec,
    ) -> Result<Self> {
        let body = codec.encode(value, body_format)?;
        Ok(Self::request(id, method, body, body_format))
    }

    /// A successful response echoing the request id and query.
    pub fn response(id: u64, query: Vec<u8>, body: Vec<u8>, body_format: BodyFormat) -> Self {
        Self::build(
            id,
            query,
            body,
            QueryFormat::JsonPointer,
            body_format,
            false,
            ErrorCode::Ok,
        )
    }

    /// An error response carrying the code's canonical message as UTF-8 body.
    pub fn error_response(id: u64, query: Vec<u8>, ec: ErrorCode) -> Self {
        Self::error_response_with(id, query, ec, ec.message())
    }

    /// An error response with explicit detail text as UTF-8 body.
    pub fn error_response_with(id: u64, query: Vec<u8>, ec: ErrorCode, detail: &str) -> Self {
        Self::build(
            id,
            query,
            detail.as_bytes().to_vec(),
            QueryFormat::JsonPointer,
            BodyFormat::Utf8,
            false,
            ec,
        )
    }

    /// Serialize to wire bytes: header, query, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.query);
        out.extend_from_slice(&self.body);
        out
    }

    /// Deserialize a full message from a single buffer.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let header = Header::from_bytes(buf)?;
        let needed = HEADER_LENGTH + header.query_length as usize + header.body_length as usize;
        if buf.len() < needed {
            return Err(ProtocolError::ShortBuffer {
                needed,
                have: buf.len(),
            });
        }
        let query_end = HEADER_LENGTH + header.query_length as usize;
        Ok(Self {
            header,
            query: buf[HEADER_LENGTH..query_end].to_vec(),
            body: buf[query_end..needed].to_vec(),
        })
    }

    /// Total frame length in bytes.
    pub fn wire_len(&self) -> usize {
        HEADER_LENGTH + self.query.len() + self.body.len()
    }

    pub fn is_notify(&self) -> bool {
        self.header.is_notify()
    }

    /// Decode the query bytes as UTF-8.
    pub fn parse_query(&self) -> Result<String> {
        String::from_utf8(self.query.clone())
            .map_err(|e| ProtocolError::InvalidQuery(format!("invalid UTF-8: {}", e)))
    }

    /// Decode the body under its tagged format.
    pub fn parse_body(&self, codec: &BodyCodec) -> Result<Body> {
        codec.decode(&self.body, self.header.body_format)
    }

    /// Decode the body into a named shape. JSON and BEVE only.
    pub fn parse_body_as<T: DeserializeOwned>(&self, codec: &BodyCodec) -> Result<T> {
        codec.decode_as(&self.body, self.header.body_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrip() {
        let msg = Message::request(7, "/add", b"{\"a\":5,\"b\":3}".to_vec(), BodyFormat::Json);
        let decoded = Message::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.parse_query().unwrap(), "/add");
        assert_eq!(decoded.header.length, 48 + 4 + 13);
    }

    #[test]
    fn empty_message_from_bare_header() {
        let header = Header::default();
        let decoded = Message::from_bytes(&header.to_bytes()).unwrap();
        assert!(decoded.query.is_empty());
        assert!(decoded.body.is_empty());
    }

    #[test]
    fn rejects_truncated_payload() {
        let msg = Message::request(1, "/x", b"body".to_vec(), BodyFormat::Utf8);
        let bytes = msg.to_bytes();
        let err = Message::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::ShortBuffer { .. }));
    }

    #[test]
    fn new_refuses_mismatched_lengths() {
        let header = Header::new(1, 4, 0);
        assert!(Message::new(header, b"/abc".to_vec(), Vec::new()).is_ok());
        assert!(Message::new(header, b"/ab".to_vec(), Vec::new()).is_err());
        assert!(Message::new(header, b"/abc".to_vec(), vec![1]).is_err());
    }

    #[test]
    fn notify_flag() {
        let msg = Message::notify(3, "/log", Vec::new(), BodyFormat::Json);
        assert!(msg.is_notify());
        assert!(!Message::request(3, "/log", Vec::new(), BodyFormat::Json).is_notify());
    }

    #[test]
    fn error_response_carries_canonical_text() {
        let msg = Message::error_response(9, b"/missing".to_vec(), ErrorCode::MethodNotFound);
        assert_eq!(msg.header.ec, ErrorCode::MethodNotFound);
        assert_eq!(msg.header.body_format, BodyFormat::Utf8);
        assert_eq!(msg.body, b"Method not found");
    }

    #[test]
    fn request_value_encodes_through_codec() {
        let codec = BodyCodec::new();
        let msg = Message::request_value(
            2,
            "/add",
            &Body::Value(json!({"a": 1})),
            BodyFormat::Json,
            &codec,
        )
        .unwrap();
        assert_eq!(msg.parse_body(&codec).unwrap(), Body::Value(json!({"a": 1})));
    }
}
