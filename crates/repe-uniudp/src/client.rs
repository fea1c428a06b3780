// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chunked-send UniUDP client

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{lookup_host, UdpSocket};

use repe_protocol::{Body, BodyCodec, BodyFormat, Message};

use crate::config::UniUdpConfig;
use crate::error::{Result, UniUdpError};
use crate::sender::{send_message, SendOptions};

/// One-way client: frames a REPE message and ships it over UniUDP with the
/// configured redundancy, chunking, and FEC.
pub struct UniUdpClient {
    socket: UdpSocket,
    dest: SocketAddr,
    config: UniUdpConfig,
    codec: BodyCodec,
    next_id: AtomicU64,
}

impl UniUdpClient {
    /// Resolve `addr` and bind an ephemeral local socket of the same family.
    pub async fn connect(addr: &str, config: UniUdpConfig) -> Result<Self> {
        config.validate().map_err(UniUdpError::InvalidArgument)?;
        let dest = lookup_host(addr)
            .await?
            .next()
            .ok_or_else(|| UniUdpError::InvalidArgument(format!("cannot resolve '{}'", addr)))?;
        let bind_addr = if dest.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(Self {
            socket,
            dest,
            config,
            codec: BodyCodec::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Replace the body codec (e.g. to inject a BEVE implementation).
    pub fn with_codec(mut self, codec: BodyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    /// Send a request frame. Returns the REPE message id.
    pub async fn send_request(
        &self,
        method: &str,
        body: &Body,
        format: BodyFormat,
    ) -> Result<u64> {
        self.send(method, body, format, false).await
    }

    /// Send a notification frame. Returns the REPE message id.
    pub async fn send_notify(&self, method: &str, body: &Body, format: BodyFormat) -> Result<u64> {
        self.send(method, body, format, true).await
    }

    async fn send(&self, method: &str, body: &Body, format: BodyFormat, notify: bool) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let bytes = self.codec.encode(body, format)?;
        let msg = if notify {
            Message::notify(id, method, bytes, format)
        } else {
            Message::request(id, method, bytes, format)
        };
        let opts = SendOptions {
            redundancy: self.config.redundancy,
            chunk_size: self.config.chunk_size,
            fec_group_size: self.config.fec_group_size,
            delay: self.config.delay,
            message_id: None,
        };
        send_message(&self.socket, self.dest, &msg.to_bytes(), &opts).await?;
        Ok(id)
    }
}
