// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multiplexing REPE client
//!
//! One TCP connection carries any number of in-flight requests. A
//! background reader task owns the read half of the socket and correlates
//! responses to waiters purely by request id; the write half sits behind
//! an async lock held for exactly one full frame, so requests are never
//! interleaved on the wire.
//!
//! Three mutual-exclusion domains, acquired one at a time: connection
//! state, the pending-request map, and the socket writer. The pending map
//! lock is never held across an await point.

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use repe_protocol::{
    Body, BodyCodec, BodyFormat, Header, Message, ProtocolError, QueryFormat, HEADER_LENGTH,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Per-request knobs.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub query_format: QueryFormat,
    pub body_format: BodyFormat,
    /// Overrides the client-wide timeout when set
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            query_format: QueryFormat::JsonPointer,
            body_format: BodyFormat::Json,
            timeout: None,
        }
    }
}

type PendingSlot = oneshot::Sender<Result<Body>>;

struct ConnState {
    reader: Option<JoinHandle<()>>,
}

struct ClientInner {
    config: ClientConfig,
    codec: BodyCodec,
    /// Visible connection state bit, toggled on open/close
    connected: RwLock<bool>,
    /// Guards connect/disconnect transitions
    conn: Mutex<ConnState>,
    /// Pending requests awaiting correlation by id
    pending: Mutex<HashMap<u64, PendingSlot>>,
    /// Write half of the socket; held for one full frame per write
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    /// Monotonic request id source, starting at 1
    next_id: AtomicU64,
}

/// Multiplexing REPE client over one TCP connection.
///
/// Cheap to clone; all clones share the connection and id space.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                codec: BodyCodec::new(),
                connected: RwLock::new(false),
                conn: Mutex::new(ConnState { reader: None }),
                pending: Mutex::new(HashMap::new()),
                writer: tokio::sync::Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Replace the body codec (e.g. to inject a BEVE implementation).
    /// Call before connecting.
    pub fn with_codec(self, codec: BodyCodec) -> Self {
        // the inner is not yet shared before connect; rebuild it
        let inner = ClientInner {
            config: self.inner.config.clone(),
            codec,
            connected: RwLock::new(false),
            conn: Mutex::new(ConnState { reader: None }),
            pending: Mutex::new(HashMap::new()),
            writer: tokio::sync::Mutex::new(None),
            next_id: AtomicU64::new(1),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.read()
    }

    /// Open the connection and spawn the background reader.
    /// Returns immediately when already connected.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.inner
            .config
            .validate()
            .map_err(ClientError::InvalidConfig)?;

        let stream = self.dial().await?;
        if self.inner.config.nodelay {
            stream.set_nodelay(true)?;
        }
        let peer = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();

        let mut writer = self.inner.writer.lock().await;
        {
            let mut conn = self.inner.conn.lock();
            if *self.inner.connected.read() {
                // a concurrent connect won the race; drop the new socket
                return Ok(());
            }
            *writer = Some(write_half);
            *self.inner.connected.write() = true;
            let client = self.clone();
            conn.reader = Some(tokio::spawn(async move {
                client.reader_loop(read_half).await;
            }));
        }
        info!("[CLIENT] Connected to {}", peer);
        Ok(())
    }

    /// Resolve and connect: IPv6 candidates first, then IPv4.
    async fn dial(&self) -> Result<TcpStream> {
        let host = self.inner.config.host.as_str();
        let port = self.inner.config.port;
        let addrs: Vec<SocketAddr> = lookup_host((host, port))
            .await
            .map_err(|_| ClientError::Resolve(host.to_string()))?
            .collect();
        if addrs.is_empty() {
            return Err(ClientError::Resolve(host.to_string()));
        }

        let ordered = addrs
            .iter()
            .filter(|a| a.is_ipv6())
            .chain(addrs.iter().filter(|a| a.is_ipv4()));

        let mut last_err: Option<std::io::Error> = None;
        for addr in ordered {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(ClientError::ConnectionFailed(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses".to_string()),
        ))
    }

    /// Close the connection, stop the reader, and fail all open slots.
    pub async fn disconnect(&self) {
        let handle = {
            let mut conn = self.inner.conn.lock();
            *self.inner.connected.write() = false;
            conn.reader.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        *self.inner.writer.lock().await = None;
        self.fail_pending(|| ClientError::Closed);
        debug!("[CLIENT] Disconnected");
    }

    pub async fn reconnect(&self) -> Result<()> {
        self.disconnect().await;
        self.connect().await
    }

    /// Send a request and wait for the correlated response body.
    pub async fn send_request(&self, method: &str, body: &Body) -> Result<Body> {
        self.send_request_with(method, body, RequestOptions::default())
            .await
    }

    /// Send a request and decode the response into a named shape.
    pub async fn send_request_as<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Body,
    ) -> Result<T> {
        match self.send_request(method, body).await? {
            Body::Value(value) => Ok(serde_json::from_value(value)?),
            Body::Empty => Ok(serde_json::from_value(serde_json::Value::Null)?),
            other => Err(ClientError::Protocol(ProtocolError::InvalidBody(format!(
                "typed decode requires a JSON or BEVE response, got {:?}",
                other
            )))),
        }
    }

    /// Send a request with explicit formats and deadline.
    pub async fn send_request_with(
        &self,
        method: &str,
        body: &Body,
        opts: RequestOptions,
    ) -> Result<Body> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        // Reserve the id and register the delivery slot before writing, so
        // a fast response can never miss its waiter.
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(id, tx);

        let encoded = match self.inner.codec.encode(body, opts.body_format) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.inner.pending.lock().remove(&id);
                return Err(e.into());
            }
        };
        let mut msg = Message::request(id, method, encoded, opts.body_format);
        msg.header.query_format = opts.query_format;

        if let Err(e) = self.write_frame(&msg).await {
            self.inner.pending.lock().remove(&id);
            return Err(e);
        }

        let deadline = opts.timeout.unwrap_or(self.inner.config.timeout);
        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                // Unregister before reporting: a late response finds no
                // slot and is dropped silently by the reader.
                self.inner.pending.lock().remove(&id);
                Err(ClientError::Timeout)
            }
        }
    }

    /// Send a notification: no pending entry, no wait.
    pub async fn send_notify(&self, method: &str, body: &Body) -> Result<()> {
        self.send_notify_with(method, body, RequestOptions::default())
            .await
    }

    pub async fn send_notify_with(
        &self,
        method: &str,
        body: &Body,
        opts: RequestOptions,
    ) -> Result<()> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let encoded = self.inner.codec.encode(body, opts.body_format)?;
        let mut msg = Message::notify(id, method, encoded, opts.body_format);
        msg.header.query_format = opts.query_format;
        self.write_frame(&msg).await
    }

    /// Schedule a request on a background task; the handle yields the
    /// result on await.
    pub fn send_request_async(&self, method: &str, body: &Body) -> RequestHandle {
        let client = self.clone();
        let method = method.to_string();
        let body = body.clone();
        RequestHandle {
            handle: tokio::spawn(async move { client.send_request(&method, &body).await }),
        }
    }

    /// Submit several requests concurrently. Pair with [`await_batch`].
    pub fn batch<I, S>(&self, requests: I) -> Vec<RequestHandle>
    where
        I: IntoIterator<Item = (S, Body)>,
        S: AsRef<str>,
    {
        requests
            .into_iter()
            .map(|(method, body)| self.send_request_async(method.as_ref(), &body))
            .collect()
    }

    /// Write one full frame under the writer lock.
    async fn write_frame(&self, msg: &Message) -> Result<()> {
        let mut writer = self.inner.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        writer.write_all(&msg.to_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Background reader: frame responses and deliver them by id.
    async fn reader_loop(self, mut read_half: OwnedReadHalf) {
        let mut header_buf = [0u8; HEADER_LENGTH];
        loop {
            if !self.is_connected() {
                break;
            }
            match read_half.read_exact(&mut header_buf).await {
                Ok(_) => {}
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::UnexpectedEof && self.is_connected() {
                        warn!("[CLIENT] Read error: {}", e);
                    }
                    break;
                }
            }
            let header = match Header::from_bytes(&header_buf) {
                Ok(header) => header,
                Err(e) => {
                    // framing is unrecoverable after a bad header
                    warn!("[CLIENT] Invalid response header: {}", e);
                    break;
                }
            };
            let mut payload = vec![0u8; (header.query_length + header.body_length) as usize];
            if let Err(e) = read_half.read_exact(&mut payload).await {
                if self.is_connected() {
                    warn!("[CLIENT] Read error: {}", e);
                }
                break;
            }
            let body = payload[header.query_length as usize..].to_vec();
            self.deliver(&header, body);
        }

        *self.inner.connected.write() = false;
        self.fail_pending(|| ClientError::Closed);
        debug!("[CLIENT] Reader stopped");
    }

    /// Hand a response to its waiter. Unknown ids (timed-out requests)
    /// are dropped silently.
    fn deliver(&self, header: &Header, body: Vec<u8>) {
        let slot = self.inner.pending.lock().remove(&header.id);
        let Some(slot) = slot else {
            debug!("[CLIENT] Dropping response for unknown id {}", header.id);
            return;
        };
        let outcome = if header.ec.is_ok() {
            self.inner
                .codec
                .decode(&body, header.body_format)
                .map_err(ClientError::from)
        } else {
            let message = match String::from_utf8(body) {
                Ok(text) if !text.is_empty() => text,
                _ => "Unknown error".to_string(),
            };
            Err(ClientError::Rpc {
                code: u32::from(header.ec),
                message,
            })
        };
        let _ = slot.send(outcome);
    }

    fn fail_pending<F>(&self, err: F)
    where
        F: Fn() -> ClientError,
    {
        let slots: Vec<PendingSlot> = {
            let mut pending = self.inner.pending.lock();
            pending.drain().map(|(_, slot)| slot).collect()
        };
        for slot in slots {
            let _ = slot.send(Err(err()));
        }
    }
}

/// Handle to a request running on a background task.
pub struct RequestHandle {
    handle: JoinHandle<Result<Body>>,
}

impl RequestHandle {
    /// Wait for the request to finish.
    pub async fn await_result(self) -> Result<Body> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ClientError::Join(e.to_string())),
        }
    }
}

/// Collect batch results in submission order.
pub async fn await_batch(handles: Vec<RequestHandle>) -> Vec<Result<Body>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await_result().await);
    }
    results
}
