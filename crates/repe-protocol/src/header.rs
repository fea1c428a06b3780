// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed 48-byte REPE header codec
//!
//! All header fields are little-endian and live at fixed offsets. The header
//! carries the total frame length, so a reader can frame a message from the
//! first 48 bytes alone.
//!
//! # Layout
//! ```text
//! [0..8]   length        u64   48 + query_length + body_length
//! [8..10]  spec          u16   0x1507
//! [10]     version       u8    1
//! [11]     notify        u8    0 = request, 1 = notification
//! [12..16] reserved      4 bytes, must be zero
//! [16..24] id            u64
//! [24..32] query_length  u64
//! [32..40] body_length   u64
//! [40..42] query_format  u16
//! [42..44] body_format   u16
//! [44..48] ec            u32
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ProtocolError, Result};
use crate::{BodyFormat, ErrorCode, QueryFormat};

/// Size of the fixed header in bytes
pub const HEADER_LENGTH: usize = 48;

/// Protocol magic number
pub const REPE_SPEC: u16 = 0x1507;

/// Protocol version this implementation speaks
pub const REPE_VERSION: u8 = 1;

/// The fixed REPE message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total frame length: `48 + query_length + body_length`
    pub length: u64,
    /// Protocol magic, always [`REPE_SPEC`]
    pub spec: u16,
    /// Protocol version, always [`REPE_VERSION`]
    pub version: u8,
    /// 1 when the sender expects no response
    pub notify: u8,
    /// Reserved, must be zero
    pub reserved: [u8; 4],
    /// Request identifier used for response correlation
    pub id: u64,
    /// Length of the query section in bytes
    pub query_length: u64,
    /// Length of the body section in bytes
    pub body_length: u64,
    /// Interpretation of the query section
    pub query_format: QueryFormat,
    /// Interpretation of the body section
    pub body_format: BodyFormat,
    /// Wire error code
    pub ec: ErrorCode,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            length: HEADER_LENGTH as u64,
            spec: REPE_SPEC,
            version: REPE_VERSION,
            notify: 0,
            reserved: [0; 4],
            id: 0,
            query_length: 0,
            body_length: 0,
            query_format: QueryFormat::JsonPointer,
            body_format: BodyFormat::Json,
            ec: ErrorCode::Ok,
        }
    }
}

impl Header {
    /// Create a header for the given section lengths, computing `length`.
    pub fn new(id: u64, query_length: u64, body_length: u64) -> Self {
        Self {
            length: HEADER_LENGTH as u64 + query_length + body_length,
            id,
            query_length,
            body_length,
            ..Default::default()
        }
    }

    /// Serialize into the fixed 48-byte wire layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut buf = [0u8; HEADER_LENGTH];
        LittleEndian::write_u64(&mut buf[0..8], self.length);
        LittleEndian::write_u16(&mut buf[8..10], self.spec);
        buf[10] = self.version;
        buf[11] = self.notify;
        buf[12..16].copy_from_slice(&self.reserved);
        LittleEndian::write_u64(&mut buf[16..24], self.id);
        LittleEndian::write_u64(&mut buf[24..32], self.query_length);
        LittleEndian::write_u64(&mut buf[32..40], self.body_length);
        LittleEndian::write_u16(&mut buf[40..42], u16::from(self.query_format));
        LittleEndian::write_u16(&mut buf[42..44], u16::from(self.body_format));
        LittleEndian::write_u32(&mut buf[44..48], u32::from(self.ec));
        buf
    }

    /// Deserialize from the wire layout, rejecting malformed headers.
    ///
    /// Fails with an invalid-header error when the buffer is shorter than
    /// 48 bytes, the magic or version do not match, or the declared total
    /// length disagrees with the section lengths.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LENGTH {
            return Err(ProtocolError::ShortBuffer {
                needed: HEADER_LENGTH,
                have: buf.len(),
            });
        }

        let length = LittleEndian::read_u64(&buf[0..8]);
        let spec = LittleEndian::read_u16(&buf[8..10]);
        let version = buf[10];
        let notify = buf[11];
        let mut reserved = [0u8; 4];
        reserved.copy_from_slice(&buf[12..16]);
        let id = LittleEndian::read_u64(&buf[16..24]);
        let query_length = LittleEndian::read_u64(&buf[24..32]);
        let body_length = LittleEndian::read_u64(&buf[32..40]);
        let query_format = QueryFormat::from(LittleEndian::read_u16(&buf[40..42]));
        let body_format = BodyFormat::from(LittleEndian::read_u16(&buf[42..44]));
        let ec = ErrorCode::from(LittleEndian::read_u32(&buf[44..48]));

        if spec != REPE_SPEC {
            return Err(ProtocolError::InvalidHeader(format!(
                "bad spec 0x{:04x}",
                spec
            )));
        }
        if version != REPE_VERSION {
            return Err(ProtocolError::InvalidHeader(format!(
                "unsupported version {}",
                version
            )));
        }
        let expected = HEADER_LENGTH as u64 + query_length + body_length;
        if length != expected {
            return Err(ProtocolError::LengthMismatch {
                declared: length,
                actual: expected,
            });
        }

        Ok(Self {
            length,
            spec,
            version,
            notify,
            reserved,
            id,
            query_length,
            body_length,
            query_format,
            body_format,
            ec,
        })
    }

    /// Check every header invariant, including zero reserved bytes.
    pub fn validate(&self) -> bool {
        self.spec == REPE_SPEC
            && self.version == REPE_VERSION
            && self.reserved == [0; 4]
            && self.length == HEADER_LENGTH as u64 + self.query_length + self.body_length
    }

    /// Whether the sender expects no response.
    pub fn is_notify(&self) -> bool {
        self.notify != 0
    }
}
