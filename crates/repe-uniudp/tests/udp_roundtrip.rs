// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for UniUDP send/receive over loopback sockets

use std::time::Duration;
use tokio::net::UdpSocket;

use repe_uniudp::{
    packet, send_message, CompletionReason, PacketHeader, Reassembler, SendOptions,
};

/// A 5000-byte payload in 1024-byte chunks with redundancy and FEC arrives
/// intact with nothing lost.
#[tokio::test]
async fn chunked_payload_roundtrip() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest = receiver.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let opts = SendOptions {
        redundancy: 2,
        chunk_size: 1024,
        fec_group_size: 4,
        ..Default::default()
    };
    let message_id = send_message(&sender, dest, &payload, &opts).await.unwrap();

    let reassembler = Reassembler::new();
    let report = reassembler
        .receive_message(
            &receiver,
            Some(message_id),
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    assert_eq!(report.completion_reason, CompletionReason::Completed);
    assert_eq!(report.chunks_expected, 5);
    assert_eq!(report.chunks_received, 5);
    assert_eq!(report.lost_chunks, Vec::<u32>::new());
    assert_eq!(report.payload.len(), 5000);
    assert_eq!(report.payload, payload);
    assert_eq!(report.fec_group_size, 4);
}

/// A completed message id is remembered: replayed packets within the dedup
/// window never produce a second report.
#[tokio::test]
async fn dedup_suppresses_replays() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest = receiver.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let opts = SendOptions {
        redundancy: 3,
        chunk_size: 64,
        ..Default::default()
    };
    let message_id = send_message(&sender, dest, b"only once", &opts)
        .await
        .unwrap();

    let reassembler = Reassembler::new();
    let report = reassembler
        .receive_message(
            &receiver,
            Some(message_id),
            Duration::from_millis(500),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(report.payload, b"only once");

    // The remaining replicas are still in flight or buffered; a second
    // receive must drain them into the dedup set and time out.
    let err = reassembler
        .receive_message(
            &receiver,
            Some(message_id),
            Duration::from_millis(100),
            Duration::from_millis(400),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, repe_uniudp::UniUdpError::Timeout));
}

/// A filtered receive hands back a partial message once the inactivity
/// window elapses with chunks still missing.
#[tokio::test]
async fn partial_delivery_on_inactivity() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest = receiver.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // chunk 0 of a two-chunk message; chunk 1 never sent
    let header = PacketHeader {
        message_id: 777,
        chunk_index: 0,
        total_chunks: 2,
        message_length: 8,
        chunk_size: 4,
        payload_len: 4,
        redundancy: 1,
        attempt: 1,
        fec_field: PacketHeader::fec_field(1, false),
    };
    sender
        .send_to(&packet::pack(&header, b"ABCD"), dest)
        .await
        .unwrap();

    let reassembler = Reassembler::new();
    let report = reassembler
        .receive_message(
            &receiver,
            Some(777),
            Duration::from_millis(200),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(report.completion_reason, CompletionReason::InactivityTimeout);
    assert_eq!(report.chunks_received, 1);
    assert_eq!(report.lost_chunks, vec![1]);
    assert_eq!(report.payload, b"ABCD");
    // the id is now deduplicated, not pending
    assert!(!reassembler.has_partial(777));
}

/// FEC repairs a dropped chunk end to end: only chunks 0 and 2 plus the
/// group parity reach the receiver.
#[tokio::test]
async fn fec_repairs_dropped_chunk_over_socket() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dest = receiver.local_addr().unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let c0 = *b"AAAA";
    let c1 = *b"BBBB";
    let c2 = *b"CC";
    let parity: Vec<u8> = c0.iter().zip(c1.iter()).map(|(a, b)| a ^ b).collect();

    let base = PacketHeader {
        message_id: 4242,
        chunk_index: 0,
        total_chunks: 3,
        message_length: 10,
        chunk_size: 4,
        payload_len: 4,
        redundancy: 1,
        attempt: 1,
        fec_field: PacketHeader::fec_field(2, false),
    };

    let mut h0 = base;
    h0.chunk_index = 0;
    sender.send_to(&packet::pack(&h0, &c0), dest).await.unwrap();

    let mut h2 = base;
    h2.chunk_index = 2;
    h2.payload_len = 2;
    sender.send_to(&packet::pack(&h2, &c2), dest).await.unwrap();

    let mut hp = base;
    hp.chunk_index = 0;
    hp.fec_field = PacketHeader::fec_field(2, true);
    sender
        .send_to(&packet::pack(&hp, &parity), dest)
        .await
        .unwrap();

    let reassembler = Reassembler::new();
    let report = reassembler
        .receive_message(
            &receiver,
            Some(4242),
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(report.completion_reason, CompletionReason::Completed);
    assert_eq!(report.fec_recovered_chunks, vec![1]);
    assert_eq!(report.payload, b"AAAABBBBCC");
}
