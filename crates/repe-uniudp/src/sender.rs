// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! UniUDP chunked sender
//!
//! Splits a payload into `chunk_size` data chunks, transmits each chunk
//! `redundancy` times with incrementing attempt numbers, and, when FEC is
//! enabled, emits one XOR parity packet per group of data chunks (also
//! `redundancy` times). The short final chunk is zero-padded when folded
//! into parity; parity packets always carry a full `chunk_size` payload.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::{Result, UniUdpError};
use crate::packet::{self, PacketHeader, PACKET_HEADER_LENGTH, SAFE_UDP_PAYLOAD};

/// Knobs for one [`send_message`] call.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Times each packet is transmitted (>= 1)
    pub redundancy: u16,
    /// Payload bytes per data chunk (>= 1)
    pub chunk_size: u16,
    /// Data chunks per XOR parity packet; 1 disables FEC (<= 0x7FFF)
    pub fec_group_size: u16,
    /// Pause between consecutive packet transmissions
    pub delay: Duration,
    /// Explicit message id; allocated from the process counter when absent
    pub message_id: Option<u64>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            redundancy: 1,
            chunk_size: 1024,
            fec_group_size: 1,
            delay: Duration::ZERO,
            message_id: None,
        }
    }
}

static MESSAGE_ID_COUNTER: OnceLock<AtomicU64> = OnceLock::new();

/// Allocate the next UniUDP message id.
///
/// Process-wide atomic counter seeded with a random value so ids from
/// restarted processes do not collide inside a receiver's dedup window.
/// Returns the pre-increment value.
pub fn next_message_id() -> u64 {
    let counter = MESSAGE_ID_COUNTER.get_or_init(|| {
        let mut seed = [0u8; 8];
        if let Err(e) = getrandom::getrandom(&mut seed) {
            warn!("[UNIUDP] OS RNG unavailable, seeding message ids from zero: {}", e);
        }
        AtomicU64::new(u64::from_le_bytes(seed))
    });
    counter.fetch_add(1, Ordering::Relaxed)
}

/// Chunk, replicate, and transmit `data` to `dest`.
///
/// Returns the message id used. A successful return means every send
/// syscall returned, not that anything was delivered.
pub async fn send_message(
    socket: &UdpSocket,
    dest: SocketAddr,
    data: &[u8],
    opts: &SendOptions,
) -> Result<u64> {
    if opts.redundancy == 0 {
        return Err(UniUdpError::InvalidArgument(
            "redundancy must be at least 1".to_string(),
        ));
    }
    if opts.chunk_size == 0 {
        return Err(UniUdpError::InvalidArgument(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    if opts.fec_group_size == 0 || opts.fec_group_size > 0x7FFF {
        return Err(UniUdpError::InvalidArgument(
            "fec_group_size must be in 1..=32767".to_string(),
        ));
    }
    if data.len() > u32::MAX as usize {
        return Err(UniUdpError::InvalidArgument(format!(
            "message of {} bytes exceeds the u32 length field",
            data.len()
        )));
    }

    let chunk_size = opts.chunk_size as usize;
    let total_chunks = ((data.len() + chunk_size - 1) / chunk_size).max(1);
    if total_chunks > u32::MAX as usize {
        return Err(UniUdpError::InvalidArgument(format!(
            "{} chunks exceed the u32 chunk index",
            total_chunks
        )));
    }
    let total_chunks = total_chunks as u32;
    let message_length = data.len() as u32;

    if PACKET_HEADER_LENGTH + chunk_size > SAFE_UDP_PAYLOAD {
        warn!(
            "[UNIUDP] chunk_size {} exceeds the safe UDP payload ({} bytes with header); expect IP fragmentation",
            opts.chunk_size, SAFE_UDP_PAYLOAD
        );
    }

    let message_id = match opts.message_id {
        Some(id) => id,
        None => next_message_id(),
    };
    let fec_enabled = opts.fec_group_size > 1;
    let group_size = opts.fec_group_size as u32;

    let mut parity = vec![0u8; chunk_size];
    let mut group_start: u32 = 0;

    for index in 0..total_chunks {
        let offset = index as usize * chunk_size;
        let end = (offset + chunk_size).min(data.len());
        let chunk = &data[offset..end];

        for attempt in 1..=opts.redundancy {
            let header = PacketHeader {
                message_id,
                chunk_index: index,
                total_chunks,
                message_length,
                chunk_size: opts.chunk_size,
                payload_len: chunk.len() as u16,
                redundancy: opts.redundancy,
                attempt,
                fec_field: PacketHeader::fec_field(opts.fec_group_size, false),
            };
            socket.send_to(&packet::pack(&header, chunk), dest).await?;
            if !opts.delay.is_zero() {
                tokio::time::sleep(opts.delay).await;
            }
        }

        if fec_enabled {
            for (acc, byte) in parity.iter_mut().zip(chunk.iter()) {
                *acc ^= byte;
            }
            let group_closes = (index - group_start) == group_size - 1;
            let is_last = index + 1 == total_chunks;
            if group_closes || is_last {
                for attempt in 1..=opts.redundancy {
                    let header = PacketHeader {
                        message_id,
                        chunk_index: group_start,
                        total_chunks,
                        message_length,
                        chunk_size: opts.chunk_size,
                        payload_len: opts.chunk_size,
                        redundancy: opts.redundancy,
                        attempt,
                        fec_field: PacketHeader::fec_field(opts.fec_group_size, true),
                    };
                    socket.send_to(&packet::pack(&header, &parity), dest).await?;
                    if !opts.delay.is_zero() {
                        tokio::time::sleep(opts.delay).await;
                    }
                }
                parity.fill(0);
                group_start = index + 1;
            }
        }
    }

    debug!(
        "[UNIUDP] Sent message {}: {} bytes in {} chunks (redundancy {}, fec group {})",
        message_id,
        data.len(),
        total_chunks,
        opts.redundancy,
        opts.fec_group_size
    );
    Ok(message_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique_and_increasing() {
        let first = next_message_id();
        let second = next_message_id();
        assert_eq!(second, first.wrapping_add(1));
    }

    #[tokio::test]
    async fn rejects_invalid_arguments() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = socket.local_addr().unwrap();
        let bad = SendOptions {
            redundancy: 0,
            ..Default::default()
        };
        assert!(send_message(&socket, dest, b"x", &bad).await.is_err());
        let bad = SendOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(send_message(&socket, dest, b"x", &bad).await.is_err());
        let bad = SendOptions {
            fec_group_size: 0x8000,
            ..Default::default()
        };
        assert!(send_message(&socket, dest, b"x", &bad).await.is_err());
    }
}
