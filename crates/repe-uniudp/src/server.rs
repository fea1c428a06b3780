// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fire-and-forget UniUDP server
//!
//! Receives datagrams, reassembles complete REPE messages, and dispatches
//! them to handlers by method. There is no response channel on this
//! transport: results of non-notify requests are routed to a configured
//! [`ResponseSink`], whose failures are caught and logged so the serve
//! loop never dies.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use repe_protocol::{Body, BodyCodec, Message};

use crate::config::UniUdpConfig;
use crate::error::{Result, UniUdpError};
use crate::reassembly::{CompletionReason, Reassembler};

/// Handler bound to a UniUDP method.
///
/// Returning `Some(value)` on a non-notify request routes the value to the
/// server's response sink; `None` (and all notifications) skip it.
#[async_trait]
pub trait UdpHandler: Send + Sync {
    async fn handle(&self, body: Body, request: Message) -> Result<Option<Value>>;
}

#[async_trait]
impl<F, Fut> UdpHandler for F
where
    F: Fn(Body, Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Value>>> + Send,
{
    async fn handle(&self, body: Body, request: Message) -> Result<Option<Value>> {
        (self)(body, request).await
    }
}

/// Destination for handler results on the one-way transport.
pub trait ResponseSink: Send + Sync {
    fn deliver(&self, method: &str, result: &Value, request: &Message) -> Result<()>;
}

impl<F> ResponseSink for F
where
    F: Fn(&str, &Value, &Message) -> Result<()> + Send + Sync,
{
    fn deliver(&self, method: &str, result: &Value, request: &Message) -> Result<()> {
        (self)(method, result, request)
    }
}

type HandlerMap = HashMap<String, Arc<dyn UdpHandler>>;

/// UniUDP server: socket, reassembler, handler table, serve loop.
pub struct UniUdpServer {
    socket: Arc<UdpSocket>,
    reassembler: Arc<Reassembler>,
    handlers: Arc<RwLock<HandlerMap>>,
    running: Arc<RwLock<bool>>,
    serve_handle: Mutex<Option<JoinHandle<()>>>,
    sink: Arc<RwLock<Option<Arc<dyn ResponseSink>>>>,
    config: UniUdpConfig,
    codec: BodyCodec,
}

impl UniUdpServer {
    /// Bind a UDP socket and prepare a server around it.
    pub async fn bind(addr: &str, config: UniUdpConfig) -> Result<Self> {
        config.validate().map_err(UniUdpError::InvalidArgument)?;
        let socket = UdpSocket::bind(addr).await?;
        info!("[UNIUDP-SRV] Listening on {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
            reassembler: Arc::new(Reassembler::new()),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(RwLock::new(false)),
            serve_handle: Mutex::new(None),
            sink: Arc::new(RwLock::new(None)),
            config,
            codec: BodyCodec::new(),
        })
    }

    /// Replace the body codec (e.g. to inject a BEVE implementation).
    pub fn with_codec(mut self, codec: BodyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Bind a handler to a method path.
    pub fn register<H>(&self, method: impl Into<String>, handler: H)
    where
        H: UdpHandler + 'static,
    {
        self.handlers.write().insert(method.into(), Arc::new(handler));
    }

    /// Route non-notify handler results to `sink`.
    pub fn set_response_sink<S>(&self, sink: S)
    where
        S: ResponseSink + 'static,
    {
        *self.sink.write() = Some(Arc::new(sink));
    }

    /// The reassembler backing this server. Exposed for cache inspection
    /// and the test-support cache clear.
    pub fn reassembler(&self) -> Arc<Reassembler> {
        Arc::clone(&self.reassembler)
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Spawn the serve loop.
    pub fn start(&self) -> Result<()> {
        if *self.running.read() {
            return Err(UniUdpError::AlreadyRunning);
        }
        *self.running.write() = true;

        let socket = Arc::clone(&self.socket);
        let reassembler = Arc::clone(&self.reassembler);
        let handlers = Arc::clone(&self.handlers);
        let running = Arc::clone(&self.running);
        let sink = Arc::clone(&self.sink);
        let codec = self.codec.clone();
        let inactivity = self.config.inactivity_timeout;
        let overall = self.config.overall_timeout;

        let handle = tokio::spawn(async move {
            while *running.read() {
                match reassembler
                    .receive_message(&socket, None, inactivity, overall)
                    .await
                {
                    Ok(report) => {
                        if report.completion_reason != CompletionReason::Completed
                            || !report.lost_chunks.is_empty()
                        {
                            warn!(
                                "[UNIUDP-SRV] Discarding incomplete message {} ({} chunks lost)",
                                report.message_id,
                                report.lost_chunks.len()
                            );
                            continue;
                        }
                        match Message::from_bytes(&report.payload) {
                            Ok(msg) => {
                                dispatch(&handlers, &codec, &sink, msg).await;
                            }
                            Err(e) => {
                                warn!(
                                    "[UNIUDP-SRV] Message {} is not a REPE frame: {}",
                                    report.message_id, e
                                );
                            }
                        }
                    }
                    // Nothing buffered within the deadline - keep serving
                    Err(UniUdpError::Timeout) => continue,
                    Err(e) => {
                        error!("[UNIUDP-SRV] Receive error: {}", e);
                    }
                }
            }
            debug!("[UNIUDP-SRV] Serve loop stopped");
        });

        *self.serve_handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop the serve loop.
    pub fn stop(&self) {
        *self.running.write() = false;
        if let Some(handle) = self.serve_handle.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for UniUdpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn dispatch(
    handlers: &RwLock<HandlerMap>,
    codec: &BodyCodec,
    sink: &RwLock<Option<Arc<dyn ResponseSink>>>,
    msg: Message,
) {
    let method = match msg.parse_query() {
        Ok(method) => method,
        Err(e) => {
            warn!("[UNIUDP-SRV] Unreadable query: {}", e);
            return;
        }
    };
    let handler = handlers.read().get(&method).cloned();
    let Some(handler) = handler else {
        warn!("[UNIUDP-SRV] No handler for method {}", method);
        return;
    };
    let body = match msg.parse_body(codec) {
        Ok(body) => body,
        Err(e) => {
            warn!("[UNIUDP-SRV] Undecodable body for {}: {}", method, e);
            return;
        }
    };

    let notify = msg.is_notify();
    match handler.handle(body, msg.clone()).await {
        Ok(Some(result)) if !notify => {
            let sink = sink.read().clone();
            if let Some(sink) = sink {
                if let Err(e) = sink.deliver(&method, &result, &msg) {
                    error!("[UNIUDP-SRV] Response sink failed for {}: {}", method, e);
                }
            }
        }
        Ok(_) => {}
        Err(e) => warn!("[UNIUDP-SRV] Handler {} failed: {}", method, e),
    }
}
