// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Concurrent multi-message chunk reassembly
//!
//! The [`Reassembler`] accepts datagrams for any number of in-flight
//! messages, tracks per-chunk redundancy observations, recovers single
//! losses per FEC group via XOR parity, and deduplicates completed
//! message ids for a fixed window.
//!
//! Two shared maps, each behind its own lock and never held across socket
//! I/O: the pending map (message_id -> partial state, capped and
//! age-evicted) and the completed map (message_id -> buffered report +
//! completion time, evicted after the dedup window).
//!
//! Packet-level inconsistencies are logged and the packet dropped; they
//! never corrupt existing state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::{Result, UniUdpError};
use crate::packet::{self, PacketHeader, MAX_DATAGRAM};

/// Maximum number of concurrently reassembling messages
pub const MAX_PENDING_MESSAGES: usize = 100;

/// Age after which a partial message is evicted
pub const PENDING_EVICTION_WINDOW: Duration = Duration::from_secs(30);

/// How long a completed message id is remembered for deduplication
pub const DEDUP_WINDOW: Duration = Duration::from_secs(10);

/// Why a receive call handed a message upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every chunk slot filled (possibly via FEC)
    Completed,
    /// The per-packet wait elapsed while a filtered message was partial
    InactivityTimeout,
    /// The overall deadline elapsed while a filtered message was partial
    OverallTimeout,
}

/// Structured outcome of a UniUDP receive.
#[derive(Debug, Clone)]
pub struct MessageReport {
    pub message_id: u64,
    /// Concatenation of chunk payloads in index order
    pub payload: Vec<u8>,
    pub chunks_expected: u32,
    /// Count of chunk slots that were filled
    pub chunks_received: u32,
    /// Sorted indices of chunk slots still empty; empty for `Completed`
    pub lost_chunks: Vec<u32>,
    /// Highest replica number any chunk needed; `redundancy + 1` when a
    /// chunk was lost or only recovered via FEC
    pub redundancy_required: u16,
    pub fec_group_size: u16,
    /// Chunk indices reconstructed from parity
    pub fec_recovered_chunks: Vec<u32>,
    pub source: SocketAddr,
    pub completion_reason: CompletionReason,
}

/// Per-message reassembly state.
struct PendingState {
    total_chunks: u32,
    chunk_size: u16,
    message_length: u32,
    redundancy: u16,
    fec_group_size: u16,
    chunks: Vec<Option<Vec<u8>>>,
    /// Minimum observed attempt per chunk; `redundancy + 1` = not received
    min_attempt: Vec<u16>,
    /// Lowest-attempt parity payload per FEC group, fixed at `chunk_size`
    parity: Vec<Option<Vec<u8>>>,
    parity_min_attempt: Vec<u16>,
    fec_recovered: Vec<u32>,
    source: SocketAddr,
    created: Instant,
}

impl PendingState {
    fn new(header: &PacketHeader, source: SocketAddr) -> Self {
        let total = header.total_chunks as usize;
        let group_size = header.fec_group_size();
        let groups = if group_size > 1 {
            (total + group_size as usize - 1) / group_size as usize
        } else {
            0
        };
        let sentinel = header.redundancy + 1;
        Self {
            total_chunks: header.total_chunks,
            chunk_size: header.chunk_size,
            message_length: header.message_length,
            redundancy: header.redundancy,
            fec_group_size: group_size,
            chunks: vec![None; total],
            min_attempt: vec![sentinel; total],
            parity: vec![None; groups],
            parity_min_attempt: vec![sentinel; groups],
            fec_recovered: Vec::new(),
            source,
            created: Instant::now(),
        }
    }

    /// Fields of a later packet must match the state created by the first.
    fn matches(&self, header: &PacketHeader) -> bool {
        self.total_chunks == header.total_chunks
            && self.chunk_size == header.chunk_size
            && self.message_length == header.message_length
            && self.redundancy == header.redundancy
            && self.fec_group_size == header.fec_group_size()
    }

    /// Expected payload length for the chunk at `index`: full for all but
    /// the final chunk, whose tail length is derived from `message_length`.
    fn expected_chunk_len(&self, index: u32) -> usize {
        if index + 1 < self.total_chunks {
            return self.chunk_size as usize;
        }
        let consumed = (self.total_chunks as u64 - 1) * self.chunk_size as u64;
        (self.message_length as u64).saturating_sub(consumed) as usize
    }

    fn is_complete(&self) -> bool {
        self.chunks.iter().all(|c| c.is_some())
    }

    /// Try to reconstruct the single missing chunk of one FEC group.
    fn try_fec_recovery(&mut self, group: usize) {
        if self.fec_group_size <= 1 {
            return;
        }
        let Some(parity) = self.parity.get(group).and_then(|p| p.clone()) else {
            return;
        };
        let start = group * self.fec_group_size as usize;
        let end = (start + self.fec_group_size as usize).min(self.total_chunks as usize);

        let missing: Vec<usize> = (start..end).filter(|&i| self.chunks[i].is_none()).collect();
        if missing.len() != 1 {
            return;
        }
        let target = missing[0];

        // Parity was accumulated by the sender with the short final chunk
        // implicitly zero-padded, so XOR-ing each present chunk over its own
        // length and trimming to the expected length reproduces the loss.
        let mut recovered = parity;
        for i in start..end {
            if i == target {
                continue;
            }
            if let Some(chunk) = &self.chunks[i] {
                for (b, c) in recovered.iter_mut().zip(chunk.iter()) {
                    *b ^= c;
                }
            }
        }
        recovered.truncate(self.expected_chunk_len(target as u32));

        debug!(
            "[UNIUDP] FEC recovered chunk {} of group {} ({} bytes)",
            target,
            group,
            recovered.len()
        );
        self.chunks[target] = Some(recovered);
        self.fec_recovered.push(target as u32);
        // min_attempt keeps the "not received" sentinel: the chunk was
        // never delivered directly.
    }

    fn into_report(self, message_id: u64, reason: CompletionReason) -> MessageReport {
        let lost_chunks: Vec<u32> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i as u32)
            .collect();
        let chunks_received = self.chunks.iter().filter(|c| c.is_some()).count() as u32;
        let redundancy_required = if lost_chunks.is_empty() {
            self.min_attempt.iter().copied().max().unwrap_or(1)
        } else {
            self.redundancy + 1
        };
        let mut payload = Vec::with_capacity(self.message_length as usize);
        for chunk in self.chunks.into_iter().flatten() {
            payload.extend_from_slice(&chunk);
        }
        let mut fec_recovered_chunks = self.fec_recovered;
        fec_recovered_chunks.sort_unstable();
        MessageReport {
            message_id,
            payload,
            chunks_expected: self.total_chunks,
            chunks_received,
            lost_chunks,
            redundancy_required,
            fec_group_size: self.fec_group_size,
            fec_recovered_chunks,
            source: self.source,
            completion_reason: reason,
        }
    }
}

/// A completed message id held for deduplication, with its report buffered
/// until some receive call returns it.
struct CompletedEntry {
    report: Option<MessageReport>,
    completed_at: Instant,
}

/// Concurrent reassembly engine for UniUDP messages.
#[derive(Default)]
pub struct Reassembler {
    pending: Mutex<HashMap<u64, PendingState>>,
    completed: Mutex<HashMap<u64, CompletedEntry>>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one datagram into the engine.
    ///
    /// Returns the message id when this packet completed a message (the
    /// report is buffered for [`Reassembler::take_completed`]). Malformed
    /// or inconsistent packets are logged and dropped.
    pub fn ingest(&self, datagram: &[u8], source: SocketAddr) -> Option<u64> {
        let (header, payload) = match packet::parse(datagram) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("[UNIUDP] Dropping packet from {}: {}", source, e);
                return None;
            }
        };
        let id = header.message_id;

        if self.completed.lock().contains_key(&id) {
            debug!("[UNIUDP] Duplicate packet for completed message {}", id);
            return None;
        }

        let mut pending = self.pending.lock();

        if !pending.contains_key(&id) {
            if header.total_chunks == 0 {
                warn!("[UNIUDP] Dropping packet from {}: zero total_chunks", source);
                return None;
            }
            if pending.len() >= MAX_PENDING_MESSAGES {
                // Cap reached with nothing stale: sacrifice the oldest entry.
                let oldest = pending
                    .iter()
                    .min_by_key(|(_, state)| state.created)
                    .map(|(&oldest_id, _)| oldest_id);
                if let Some(oldest_id) = oldest {
                    warn!("[UNIUDP] Pending cap reached, evicting message {}", oldest_id);
                    pending.remove(&oldest_id);
                }
            }
            pending.insert(id, PendingState::new(&header, source));
        }

        let Some(state) = pending.get_mut(&id) else {
            return None;
        };
        if !state.matches(&header) {
            warn!(
                "[UNIUDP] Inconsistent packet for message {} (fields differ from first observation), dropping",
                id
            );
            return None;
        }
        if header.attempt == 0 || header.attempt > state.redundancy {
            warn!(
                "[UNIUDP] Attempt {} out of range for message {} (redundancy {}), dropping",
                header.attempt, id, state.redundancy
            );
            return None;
        }
        if header.chunk_index >= state.total_chunks {
            warn!(
                "[UNIUDP] Chunk index {} out of range for message {} ({} chunks), dropping",
                header.chunk_index, id, state.total_chunks
            );
            return None;
        }

        if header.is_parity() {
            self.ingest_parity(state, &header, payload);
        } else {
            self.ingest_data(state, &header, payload);
        }

        if state.is_complete() {
            let Some(state) = pending.remove(&id) else {
                return None;
            };
            drop(pending);
            let report = state.into_report(id, CompletionReason::Completed);
            debug!(
                "[UNIUDP] Message {} complete: {} chunks, {} bytes, {} FEC-recovered",
                id,
                report.chunks_expected,
                report.payload.len(),
                report.fec_recovered_chunks.len()
            );
            self.completed.lock().insert(
                id,
                CompletedEntry {
                    report: Some(report),
                    completed_at: Instant::now(),
                },
            );
            return Some(id);
        }
        None
    }

    fn ingest_data(&self, state: &mut PendingState, header: &PacketHeader, payload: &[u8]) {
        let index = header.chunk_index as usize;
        let expected = state.expected_chunk_len(header.chunk_index);
        if payload.len() != expected {
            warn!(
                "[UNIUDP] Chunk {} of message {} has {} bytes, expected {}, dropping",
                header.chunk_index,
                header.message_id,
                payload.len(),
                expected
            );
            return;
        }

        // First observation wins for content; any observation lowers the
        // attempt floor.
        if state.chunks[index].is_none() {
            state.chunks[index] = Some(payload.to_vec());
        }
        state.min_attempt[index] = state.min_attempt[index].min(header.attempt);

        if state.fec_group_size > 1 {
            let group = index / state.fec_group_size as usize;
            state.try_fec_recovery(group);
        }
    }

    fn ingest_parity(&self, state: &mut PendingState, header: &PacketHeader, payload: &[u8]) {
        if state.fec_group_size <= 1 {
            warn!(
                "[UNIUDP] Parity packet for message {} with FEC disabled, dropping",
                header.message_id
            );
            return;
        }
        if header.chunk_index % state.fec_group_size as u32 != 0 {
            warn!(
                "[UNIUDP] Parity chunk_index {} not group-aligned for message {}, dropping",
                header.chunk_index, header.message_id
            );
            return;
        }
        if payload.len() != state.chunk_size as usize {
            warn!(
                "[UNIUDP] Parity payload of message {} has {} bytes, expected chunk_size {}, dropping",
                header.message_id,
                payload.len(),
                state.chunk_size
            );
            return;
        }
        let group = header.chunk_index as usize / state.fec_group_size as usize;

        if header.attempt < state.parity_min_attempt[group] {
            state.parity[group] = Some(payload.to_vec());
            state.parity_min_attempt[group] = header.attempt;
        }
        state.try_fec_recovery(group);
    }

    /// Take a buffered complete report, optionally for one message id.
    /// The id stays in the dedup set for the remainder of its window.
    pub fn take_completed(&self, filter: Option<u64>) -> Option<MessageReport> {
        let mut completed = self.completed.lock();
        match filter {
            Some(id) => completed.get_mut(&id).and_then(|e| e.report.take()),
            None => completed.values_mut().find_map(|e| e.report.take()),
        }
    }

    /// Remove a partial message and report it with the given reason,
    /// entering its id into the dedup set.
    fn take_partial(&self, id: u64, reason: CompletionReason) -> Option<MessageReport> {
        let state = self.pending.lock().remove(&id)?;
        let report = state.into_report(id, reason);
        self.completed.lock().insert(
            id,
            CompletedEntry {
                report: None,
                completed_at: Instant::now(),
            },
        );
        Some(report)
    }

    /// Evict pending entries past the 30-second window and dedup entries
    /// past the 10-second window. Called at the top of every receive loop.
    pub fn evict_expired(&self) {
        {
            let mut pending = self.pending.lock();
            pending.retain(|id, state| {
                let keep = state.created.elapsed() <= PENDING_EVICTION_WINDOW;
                if !keep {
                    warn!("[UNIUDP] Evicting stale partial message {}", id);
                }
                keep
            });
        }
        self.completed
            .lock()
            .retain(|_, entry| entry.completed_at.elapsed() <= DEDUP_WINDOW);
    }

    /// Drop all pending and dedup state. Test support.
    pub fn clear_caches(&self) {
        let mut pending = self.pending.lock();
        let mut completed = self.completed.lock();
        pending.clear();
        completed.clear();
    }

    /// Number of messages currently reassembling.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether a partial state exists for the id.
    pub fn has_partial(&self, id: u64) -> bool {
        self.pending.lock().contains_key(&id)
    }

    /// Receive datagrams from `socket` until a message can be delivered.
    ///
    /// With `filter` set, only that message id is delivered: complete if
    /// possible, else partial with `InactivityTimeout` once the per-packet
    /// wait elapses, else partial with `OverallTimeout` at the deadline.
    /// Without a filter, the first completed message is delivered; the
    /// overall deadline expiring with nothing complete is a timeout error.
    pub async fn receive_message(
        &self,
        socket: &UdpSocket,
        filter: Option<u64>,
        inactivity_timeout: Duration,
        overall_timeout: Duration,
    ) -> Result<MessageReport> {
        let start = Instant::now();
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            self.evict_expired();
            if let Some(report) = self.take_completed(filter) {
                return Ok(report);
            }

            let elapsed = start.elapsed();
            if elapsed >= overall_timeout {
                if let Some(id) = filter {
                    if let Some(report) = self.take_partial(id, CompletionReason::OverallTimeout) {
                        return Ok(report);
                    }
                }
                return Err(UniUdpError::Timeout);
            }
            let remaining = overall_timeout - elapsed;
            let wait = inactivity_timeout.min(remaining);

            match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, source))) => {
                    if let Some(done) = self.ingest(&buf[..len], source) {
                        let deliverable = match filter {
                            Some(id) => id == done,
                            None => true,
                        };
                        if deliverable {
                            if let Some(report) = self.take_completed(filter) {
                                return Ok(report);
                            }
                        }
                    }
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    // No packet within the bounded wait. Deliver a partial
                    // only when the inactivity window truly elapsed (not
                    // when the wait was clipped by the overall deadline).
                    if wait >= inactivity_timeout {
                        if let Some(id) = filter {
                            if let Some(report) =
                                self.take_partial(id, CompletionReason::InactivityTimeout)
                            {
                                return Ok(report);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::pack;

    fn addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    fn data_packet(
        id: u64,
        index: u32,
        total: u32,
        message_length: u32,
        chunk_size: u16,
        redundancy: u16,
        attempt: u16,
        group_size: u16,
        payload: &[u8],
    ) -> Vec<u8> {
        let header = PacketHeader {
            message_id: id,
            chunk_index: index,
            total_chunks: total,
            message_length,
            chunk_size,
            payload_len: payload.len() as u16,
            redundancy,
            attempt,
            fec_field: PacketHeader::fec_field(group_size, false),
        };
        pack(&header, payload)
    }

    fn parity_packet(
        id: u64,
        group_start: u32,
        total: u32,
        message_length: u32,
        chunk_size: u16,
        redundancy: u16,
        attempt: u16,
        group_size: u16,
        payload: &[u8],
    ) -> Vec<u8> {
        let header = PacketHeader {
            message_id: id,
            chunk_index: group_start,
            total_chunks: total,
            message_length,
            chunk_size,
            payload_len: payload.len() as u16,
            redundancy,
            attempt,
            fec_field: PacketHeader::fec_field(group_size, true),
        };
        pack(&header, payload)
    }

    #[test]
    fn out_of_order_chunks_assemble() {
        let r = Reassembler::new();
        // two chunks of 4 bytes, sent in order [1, 0]
        assert_eq!(
            r.ingest(&data_packet(1, 1, 2, 8, 4, 2, 1, 1, b"WXYZ"), addr()),
            None
        );
        let done = r.ingest(&data_packet(1, 0, 2, 8, 4, 2, 1, 1, b"ABCD"), addr());
        assert_eq!(done, Some(1));

        let report = r.take_completed(Some(1)).unwrap();
        assert_eq!(report.payload, b"ABCDWXYZ");
        assert_eq!(report.lost_chunks, Vec::<u32>::new());
        assert_eq!(report.chunks_received, 2);
        assert_eq!(report.completion_reason, CompletionReason::Completed);
    }

    #[test]
    fn min_attempt_tracks_lowest_observation() {
        let r = Reassembler::new();
        // attempt 2 arrives first, then attempt 1 for the same chunk
        r.ingest(&data_packet(2, 0, 2, 8, 4, 3, 2, 1, b"ABCD"), addr());
        r.ingest(&data_packet(2, 0, 2, 8, 4, 3, 1, 1, b"ABCD"), addr());
        r.ingest(&data_packet(2, 1, 2, 8, 4, 3, 3, 1, b"EFGH"), addr());
        let report = r.take_completed(Some(2)).unwrap();
        // chunk 1 needed attempt 3, so that is the fleet-wide requirement
        assert_eq!(report.redundancy_required, 3);
    }

    #[test]
    fn first_payload_wins_for_content() {
        let r = Reassembler::new();
        r.ingest(&data_packet(3, 0, 1, 4, 4, 2, 1, 1, b"GOOD"), addr());
        // same chunk, later attempt, different bytes - content must not change
        r.ingest(&data_packet(3, 0, 1, 4, 4, 2, 2, 1, b"EVIL"), addr());
        let report = r.take_completed(Some(3)).unwrap();
        assert_eq!(report.payload, b"GOOD");
    }

    #[test]
    fn fec_recovers_single_loss() {
        let r = Reassembler::new();
        // 3 chunks of 4 bytes, group size 2, redundancy 1; chunk 1 dropped
        let c0 = b"\x01\x02\x03\x04";
        let c1 = b"\x10\x20\x30\x40";
        let c2 = b"\x0A\x0B\x0C\x0D";
        let parity: Vec<u8> = c0.iter().zip(c1.iter()).map(|(a, b)| a ^ b).collect();

        r.ingest(&data_packet(4, 0, 3, 12, 4, 1, 1, 2, c0), addr());
        r.ingest(&data_packet(4, 2, 3, 12, 4, 1, 1, 2, c2), addr());
        let done = r.ingest(&parity_packet(4, 0, 3, 12, 4, 1, 1, 2, &parity), addr());
        assert_eq!(done, Some(4));

        let report = r.take_completed(Some(4)).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(c0);
        expected.extend_from_slice(c1);
        expected.extend_from_slice(c2);
        assert_eq!(report.payload, expected);
        assert_eq!(report.fec_recovered_chunks, vec![1]);
        assert_eq!(report.lost_chunks, Vec::<u32>::new());
        // FEC recovery means direct redundancy was insufficient
        assert_eq!(report.redundancy_required, 2);
    }

    #[test]
    fn fec_recovers_short_tail_chunk() {
        let r = Reassembler::new();
        // 2 chunks: full 4 bytes + 2-byte tail, group size 2; tail dropped
        let c0 = b"\xAA\xBB\xCC\xDD";
        let c1 = b"\x11\x22";
        // sender pads the short tail with zeros when accumulating parity
        let parity: Vec<u8> = vec![0xAA ^ 0x11, 0xBB ^ 0x22, 0xCC, 0xDD];

        r.ingest(&data_packet(5, 0, 2, 6, 4, 1, 1, 2, c0), addr());
        let done = r.ingest(&parity_packet(5, 0, 2, 6, 4, 1, 1, 2, &parity), addr());
        assert_eq!(done, Some(5));

        let report = r.take_completed(Some(5)).unwrap();
        assert_eq!(report.payload, b"\xAA\xBB\xCC\xDD\x11\x22");
        assert_eq!(report.fec_recovered_chunks, vec![1]);
    }

    #[test]
    fn dedup_discards_replays_after_completion() {
        let r = Reassembler::new();
        r.ingest(&data_packet(6, 0, 1, 4, 4, 3, 1, 1, b"ONCE"), addr());
        assert!(r.take_completed(Some(6)).is_some());

        // replayed packets within the window do not create new state
        assert_eq!(
            r.ingest(&data_packet(6, 0, 1, 4, 4, 3, 2, 1, b"ONCE"), addr()),
            None
        );
        assert!(r.take_completed(Some(6)).is_none());
        assert_eq!(r.pending_len(), 0);
    }

    #[test]
    fn inconsistent_fields_are_dropped() {
        let r = Reassembler::new();
        r.ingest(&data_packet(7, 0, 2, 8, 4, 2, 1, 1, b"ABCD"), addr());
        // same message id, different chunk_size - must not corrupt state
        r.ingest(&data_packet(7, 1, 2, 8, 8, 2, 1, 1, b"EFGH"), addr());
        assert!(r.has_partial(7));
        let done = r.ingest(&data_packet(7, 1, 2, 8, 4, 2, 1, 1, b"EFGH"), addr());
        assert_eq!(done, Some(7));
    }

    #[test]
    fn attempt_out_of_range_is_dropped() {
        let r = Reassembler::new();
        r.ingest(&data_packet(8, 0, 1, 4, 4, 2, 3, 1, b"ABCD"), addr());
        assert!(r.take_completed(Some(8)).is_none());
        r.ingest(&data_packet(8, 0, 1, 4, 4, 2, 0, 1, b"ABCD"), addr());
        assert!(r.take_completed(Some(8)).is_none());
    }

    #[test]
    fn wrong_chunk_length_is_dropped() {
        let r = Reassembler::new();
        // non-final chunk must be full chunk_size; the short one is dropped
        r.ingest(&data_packet(9, 0, 2, 8, 4, 1, 1, 1, b"AB"), addr());
        r.ingest(&data_packet(9, 0, 2, 8, 4, 1, 1, 1, b"ABCD"), addr());
        let done = r.ingest(&data_packet(9, 1, 2, 8, 4, 1, 1, 1, b"EFGH"), addr());
        assert_eq!(done, Some(9));
        assert_eq!(r.take_completed(Some(9)).unwrap().payload, b"ABCDEFGH");
    }

    #[test]
    fn clear_caches_resets_everything() {
        let r = Reassembler::new();
        r.ingest(&data_packet(10, 0, 2, 8, 4, 1, 1, 1, b"ABCD"), addr());
        r.ingest(&data_packet(11, 0, 1, 4, 4, 1, 1, 1, b"DONE"), addr());
        r.clear_caches();
        assert_eq!(r.pending_len(), 0);
        assert!(r.take_completed(None).is_none());
    }

    #[test]
    fn pending_cap_evicts_oldest() {
        let r = Reassembler::new();
        for id in 0..MAX_PENDING_MESSAGES as u64 {
            r.ingest(&data_packet(id, 0, 2, 8, 4, 1, 1, 1, b"ABCD"), addr());
        }
        assert_eq!(r.pending_len(), MAX_PENDING_MESSAGES);
        r.ingest(&data_packet(9000, 0, 2, 8, 4, 1, 1, 1, b"ABCD"), addr());
        assert_eq!(r.pending_len(), MAX_PENDING_MESSAGES);
        assert!(r.has_partial(9000));
    }
}
