// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! UniUDP packet codec
//!
//! Every datagram carries a 30-byte big-endian header followed by the chunk
//! payload. Note the endianness deliberately differs from the little-endian
//! REPE header: UniUDP packet fields are network byte order.
//!
//! # Layout
//! ```text
//! [0..8]   message_id     u64
//! [8..12]  chunk_index    u32
//! [12..16] total_chunks   u32
//! [16..20] message_length u32
//! [20..22] chunk_size     u16
//! [22..24] payload_len    u16
//! [24..26] redundancy     u16
//! [26..28] attempt        u16   1-based replica number
//! [28..30] fec_field      u16   (group_size << 1) | parity_flag
//! ```

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, UniUdpError};

/// Size of the packet header in bytes
pub const PACKET_HEADER_LENGTH: usize = 30;

/// Conservative UDP payload ceiling before IP fragmentation risk
pub const SAFE_UDP_PAYLOAD: usize = 1452;

/// Largest possible datagram: header plus a maximal chunk
pub const MAX_DATAGRAM: usize = PACKET_HEADER_LENGTH + u16::MAX as usize;

/// UniUDP packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub message_id: u64,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub message_length: u32,
    pub chunk_size: u16,
    pub payload_len: u16,
    pub redundancy: u16,
    /// 1-based replica number in `1..=redundancy`
    pub attempt: u16,
    /// Packed FEC descriptor: `(group_size << 1) | parity_flag`
    pub fec_field: u16,
}

impl PacketHeader {
    /// Pack a group size and parity flag into the wire field.
    pub fn fec_field(group_size: u16, parity: bool) -> u16 {
        (group_size << 1) | parity as u16
    }

    /// FEC group size; 1 means FEC is disabled.
    pub fn fec_group_size(&self) -> u16 {
        self.fec_field >> 1
    }

    /// Whether this packet carries XOR parity rather than data.
    pub fn is_parity(&self) -> bool {
        self.fec_field & 1 == 1
    }

    /// Serialize into the fixed 30-byte wire layout.
    pub fn to_bytes(&self) -> [u8; PACKET_HEADER_LENGTH] {
        let mut buf = [0u8; PACKET_HEADER_LENGTH];
        BigEndian::write_u64(&mut buf[0..8], self.message_id);
        BigEndian::write_u32(&mut buf[8..12], self.chunk_index);
        BigEndian::write_u32(&mut buf[12..16], self.total_chunks);
        BigEndian::write_u32(&mut buf[16..20], self.message_length);
        BigEndian::write_u16(&mut buf[20..22], self.chunk_size);
        BigEndian::write_u16(&mut buf[22..24], self.payload_len);
        BigEndian::write_u16(&mut buf[24..26], self.redundancy);
        BigEndian::write_u16(&mut buf[26..28], self.attempt);
        BigEndian::write_u16(&mut buf[28..30], self.fec_field);
        buf
    }

    /// Deserialize the header fields alone. Prefer [`parse`] for datagrams.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < PACKET_HEADER_LENGTH {
            return Err(UniUdpError::InvalidPacket(format!(
                "datagram too short: {} bytes",
                buf.len()
            )));
        }
        Ok(Self {
            message_id: BigEndian::read_u64(&buf[0..8]),
            chunk_index: BigEndian::read_u32(&buf[8..12]),
            total_chunks: BigEndian::read_u32(&buf[12..16]),
            message_length: BigEndian::read_u32(&buf[16..20]),
            chunk_size: BigEndian::read_u16(&buf[20..22]),
            payload_len: BigEndian::read_u16(&buf[22..24]),
            redundancy: BigEndian::read_u16(&buf[24..26]),
            attempt: BigEndian::read_u16(&buf[26..28]),
            fec_field: BigEndian::read_u16(&buf[28..30]),
        })
    }
}

/// Serialize a header and payload into one datagram.
pub fn pack(header: &PacketHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PACKET_HEADER_LENGTH + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parse a datagram into a validated header and its payload slice.
pub fn parse(buf: &[u8]) -> Result<(PacketHeader, &[u8])> {
    let header = PacketHeader::from_bytes(buf)?;
    let end = PACKET_HEADER_LENGTH + header.payload_len as usize;
    if buf.len() < end {
        return Err(UniUdpError::InvalidPacket(format!(
            "datagram shorter than declared payload: {} < {}",
            buf.len(),
            end
        )));
    }
    if header.payload_len > header.chunk_size {
        return Err(UniUdpError::InvalidPacket(format!(
            "payload_len {} exceeds chunk_size {}",
            header.payload_len, header.chunk_size
        )));
    }
    if header.fec_group_size() == 0 {
        return Err(UniUdpError::InvalidPacket(
            "fec_field declares group size 0".to_string(),
        ));
    }
    Ok((header, &buf[PACKET_HEADER_LENGTH..end]))
}
