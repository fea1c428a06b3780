//! # repe-uniudp
//!
//! One-way reliable-ish datagram transport for REPE messages.
//!
//! Large payloads are split into chunks, every chunk is transmitted
//! `redundancy` times, and an optional XOR parity chunk per FEC group lets
//! the receiver repair a single loss per group without retransmission.
//! Receivers keep per-message reassembly state for any number of
//! overlapping messages and deduplicate completed ids for a fixed window.
//!
//! The 30-byte packet header is big-endian - deliberately different from
//! the little-endian REPE framing it carries.
//!
//! ## Example: send and receive
//!
//! ```no_run
//! use repe_uniudp::{send_message, Reassembler, SendOptions};
//! use std::time::Duration;
//!
//! # async fn demo() -> repe_uniudp::Result<()> {
//! let socket = tokio::net::UdpSocket::bind("0.0.0.0:0").await?;
//! let dest = "127.0.0.1:5600".parse().unwrap();
//! let opts = SendOptions { redundancy: 2, chunk_size: 1024, fec_group_size: 4, ..Default::default() };
//! send_message(&socket, dest, b"payload", &opts).await?;
//!
//! let receiver = tokio::net::UdpSocket::bind("127.0.0.1:5600").await?;
//! let reassembler = Reassembler::new();
//! let report = reassembler
//!     .receive_message(&receiver, None, Duration::from_secs(1), Duration::from_secs(10))
//!     .await?;
//! assert!(report.lost_chunks.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fleet;
pub mod packet;
pub mod reassembly;
pub mod sender;
pub mod server;

pub use client::UniUdpClient;
pub use config::UniUdpConfig;
pub use error::{Result, UniUdpError};
pub use fleet::{SendResult, UdpNodeConfig, UniUdpFleet};
pub use packet::{PacketHeader, MAX_DATAGRAM, PACKET_HEADER_LENGTH, SAFE_UDP_PAYLOAD};
pub use reassembly::{
    CompletionReason, MessageReport, Reassembler, DEDUP_WINDOW, MAX_PENDING_MESSAGES,
    PENDING_EVICTION_WINDOW,
};
pub use sender::{next_message_id, send_message, SendOptions};
pub use server::{ResponseSink, UdpHandler, UniUdpServer};
