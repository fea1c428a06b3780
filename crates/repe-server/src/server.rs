// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! REPE TCP server
//!
//! One spawned task runs the accept loop; every accepted connection gets
//! its own task, so slow connections never stall the listener. Within a
//! connection, requests are processed in arrival order and responses are
//! written by the same task, so frames on the wire are never interleaved.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use repe_protocol::{BodyCodec, BodyFormat, ErrorCode, Header, Message, HEADER_LENGTH};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handler::{Handler, HandlerResult, Middleware, MiddlewareVerdict};

type HandlerMap = HashMap<String, Arc<dyn Handler>>;
type MiddlewareChain = Vec<Arc<dyn Middleware>>;

/// Handler-dispatching REPE server over TCP.
pub struct Server {
    config: ServerConfig,
    running: Arc<RwLock<bool>>,
    handlers: Arc<RwLock<HandlerMap>>,
    middleware: Arc<RwLock<MiddlewareChain>>,
    codec: BodyCodec,
    local_addr: Arc<RwLock<Option<SocketAddr>>>,
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            running: Arc::new(RwLock::new(false)),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            middleware: Arc::new(RwLock::new(Vec::new())),
            codec: BodyCodec::new(),
            local_addr: Arc::new(RwLock::new(None)),
            accept_handle: Mutex::new(None),
        }
    }

    /// Replace the body codec (e.g. to inject a BEVE implementation).
    pub fn with_codec(mut self, codec: BodyCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Bind a handler to a method path.
    pub fn register<H>(&self, method: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.write().insert(method.into(), Arc::new(handler));
    }

    /// Append a middleware to the chain. Middleware runs in registration
    /// order before handler dispatch.
    pub fn add_middleware<M>(&self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middleware.write().push(Arc::new(middleware));
    }

    /// The bound listen address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Resolve the listen address, bind, and spawn the accept loop.
    pub async fn start(&self) -> Result<()> {
        if *self.running.read() {
            return Err(ServerError::AlreadyRunning);
        }
        self.config.validate().map_err(ServerError::InvalidConfig)?;

        let addr = resolve_listen_addr(&self.config.host, self.config.port).await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(e.to_string()))?;
        let bound = listener.local_addr()?;
        *self.local_addr.write() = Some(bound);
        *self.running.write() = true;
        info!("[SERVER] Listening on {}", bound);

        let running = Arc::clone(&self.running);
        let handlers = Arc::clone(&self.handlers);
        let middleware = Arc::clone(&self.middleware);
        let codec = self.codec.clone();
        let max_message_size = self.config.max_message_size;

        let handle = tokio::spawn(async move {
            loop {
                if !*running.read() {
                    break;
                }
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!("[SERVER] New connection from {}", peer);
                        let handlers = Arc::clone(&handlers);
                        let middleware = Arc::clone(&middleware);
                        let codec = codec.clone();
                        let running = Arc::clone(&running);
                        tokio::spawn(async move {
                            handle_connection(
                                stream,
                                peer,
                                handlers,
                                middleware,
                                codec,
                                running,
                                max_message_size,
                            )
                            .await;
                        });
                    }
                    Err(e) => {
                        if *running.read() {
                            error!("[SERVER] Accept error: {}", e);
                        } else {
                            break;
                        }
                    }
                }
            }
            debug!("[SERVER] Accept loop stopped");
        });

        *self.accept_handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop accepting. In-flight connection tasks drain as their sockets
    /// close.
    pub fn stop(&self) {
        *self.running.write() = false;
        if let Some(handle) = self.accept_handle.lock().take() {
            // Aborting the accept task drops the listener and closes it
            handle.abort();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Listen-address resolution: empty / `*` / `0.0.0.0` mean IPv4
/// all-interfaces, `::` means IPv6 all-interfaces, anything else takes the
/// first resolved address (IPv4 preferred, then IPv6).
async fn resolve_listen_addr(host: &str, port: u16) -> Result<SocketAddr> {
    match host {
        "" | "*" | "0.0.0.0" => Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))),
        "::" => Ok(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port))),
        name => {
            let addrs: Vec<SocketAddr> = lookup_host((name, port))
                .await
                .map_err(|_| ServerError::Resolve(name.to_string()))?
                .collect();
            addrs
                .iter()
                .find(|a| a.is_ipv4())
                .or_else(|| addrs.first())
                .copied()
                .ok_or_else(|| ServerError::Resolve(name.to_string()))
        }
    }
}

/// Per-connection read loop: frame, run middleware, dispatch, respond.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handlers: Arc<RwLock<HandlerMap>>,
    middleware: Arc<RwLock<MiddlewareChain>>,
    codec: BodyCodec,
    running: Arc<RwLock<bool>>,
    max_message_size: Option<usize>,
) {
    let mut header_buf = [0u8; HEADER_LENGTH];
    while *running.read() {
        match stream.read_exact(&mut header_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                warn!("[SERVER] Read error from {}: {}", peer, e);
                break;
            }
        }

        let header = match Header::from_bytes(&header_buf) {
            Ok(header) => header,
            Err(e) => {
                warn!("[SERVER] Invalid header from {}: {}", peer, e);
                let reject = Message::error_response(0, Vec::new(), ErrorCode::InvalidHeader);
                let _ = stream.write_all(&reject.to_bytes()).await;
                // framing is lost after a bad header; drop the connection
                break;
            }
        };

        let payload_len = (header.query_length + header.body_length) as usize;
        if let Some(max_size) = max_message_size {
            if payload_len > max_size {
                warn!(
                    "[SERVER] Frame of {} bytes from {} exceeds the {} byte cap",
                    payload_len, peer, max_size
                );
                if !header.is_notify() {
                    let reject = Message::error_response_with(
                        header.id,
                        Vec::new(),
                        ErrorCode::InvalidHeader,
                        &format!("message of {} bytes exceeds the server cap", payload_len),
                    );
                    let _ = stream.write_all(&reject.to_bytes()).await;
                }
                // the oversized payload is never read; drop the connection
                break;
            }
        }
        let mut payload = vec![0u8; payload_len];
        if let Err(e) = stream.read_exact(&mut payload).await {
            warn!("[SERVER] Read error from {}: {}", peer, e);
            break;
        }
        let query_end = header.query_length as usize;
        let request = Message {
            header,
            query: payload[..query_end].to_vec(),
            body: payload[query_end..].to_vec(),
        };

        let notify = request.is_notify();
        let response = process_request(request, &handlers, &middleware, &codec).await;

        if !notify {
            if let Err(e) = stream.write_all(&response.to_bytes()).await {
                warn!("[SERVER] Write error to {}: {}", peer, e);
                break;
            }
            if let Err(e) = stream.flush().await {
                warn!("[SERVER] Flush error to {}: {}", peer, e);
                break;
            }
        }
    }
    debug!("[SERVER] Connection from {} closed", peer);
}

/// Run the middleware chain and dispatch to the handler, producing the
/// response message (which is discarded by the caller for notifications).
async fn process_request(
    request: Message,
    handlers: &RwLock<HandlerMap>,
    middleware: &RwLock<MiddlewareChain>,
    codec: &BodyCodec,
) -> Message {
    let id = request.header.id;

    let chain: MiddlewareChain = middleware.read().clone();
    for mw in chain {
        match mw.call(&request).await {
            MiddlewareVerdict::Continue => {}
            MiddlewareVerdict::ShortCircuit(response) => return response,
            MiddlewareVerdict::Reject(code) => {
                return Message::error_response(id, request.query.clone(), code)
            }
        }
    }

    let method = match request.parse_query() {
        Ok(method) => method,
        Err(e) => {
            return Message::error_response_with(
                id,
                request.query.clone(),
                ErrorCode::InvalidQuery,
                &e.to_string(),
            )
        }
    };

    let handler = handlers.read().get(&method).cloned();
    let Some(handler) = handler else {
        debug!("[SERVER] Method not found: {}", method);
        return Message::error_response(id, request.query.clone(), ErrorCode::MethodNotFound);
    };

    let body = match request.parse_body(codec) {
        Ok(body) => body,
        Err(e) => {
            return Message::error_response_with(
                id,
                request.query.clone(),
                e.wire_code(),
                &e.to_string(),
            )
        }
    };

    let query = request.query.clone();
    match handler.handle(body, request).await {
        Ok(HandlerResult::Raw(response)) => response,
        Ok(HandlerResult::Value(value)) => match serde_json::to_vec(&value) {
            Ok(bytes) => Message::response(id, query, bytes, BodyFormat::Json),
            Err(e) => {
                Message::error_response_with(id, query, ErrorCode::ParseError, &e.to_string())
            }
        },
        Err(e) => {
            Message::error_response_with(id, query, ErrorCode::ParseError, &e.to_string())
        }
    }
}
