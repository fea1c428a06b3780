// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # REPE - binary RPC stack
//!
//! A binary RPC stack built around the REPE wire format: a fixed 48-byte
//! little-endian header plus query/body sections, carried over TCP by a
//! multiplexing client and a handler-dispatching server, and over UDP by
//! the UniUDP one-way transport (chunking, per-chunk redundancy, and
//! single-loss XOR forward error correction).
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! repe = "0.1"  # Umbrella crate (default: full stack)
//! ```
//!
//! ## Feature Flags
//!
//! - **`full`** (default): all components
//! - **`client`**: TCP multiplexing client
//! - **`server`**: TCP server with middleware and handler dispatch
//! - **`registry`**: JSON-Pointer dispatch tree
//! - **`fleet`**: parallel fan-out to named nodes
//! - **`uniudp`**: one-way datagram transport with FEC
//! - **`observability`**: logging initialization
//!
//! The wire protocol (`repe::protocol`) is always compiled.
//!
//! ## Example: request/response over TCP
//!
//! ```rust,no_run
//! use repe::client::{Client, ClientConfig};
//! use repe::protocol::Body;
//! use repe::server::{HandlerResult, Server, ServerConfig};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::new(ServerConfig::new("127.0.0.1", 5510));
//! server.register("/add", |body: repe::protocol::Body, _req: repe::protocol::Message| async move {
//!     let v = body.as_value().cloned().unwrap_or(json!({}));
//!     Ok(HandlerResult::Value(json!({
//!         "result": v["a"].as_i64().unwrap_or(0) + v["b"].as_i64().unwrap_or(0)
//!     })))
//! });
//! server.start().await?;
//!
//! let client = Client::new(ClientConfig::new("127.0.0.1", 5510));
//! client.connect().await?;
//! let result = client.send_request("/add", &Body::Value(json!({"a": 5, "b": 3}))).await?;
//! # Ok(())
//! # }
//! ```

pub use repe_protocol as protocol;

#[cfg(feature = "client")]
pub use repe_client as client;

#[cfg(feature = "server")]
pub use repe_server as server;

#[cfg(feature = "registry")]
pub use repe_registry as registry;

#[cfg(feature = "fleet")]
pub use repe_fleet as fleet;

#[cfg(feature = "uniudp")]
pub use repe_uniudp as uniudp;

#[cfg(feature = "observability")]
pub use repe_observability as observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::protocol::{
        Body, BodyCodec, BodyFormat, ErrorCode, Header, Message, QueryFormat,
    };

    #[cfg(feature = "client")]
    pub use crate::client::{Client, ClientConfig, RequestOptions};

    #[cfg(feature = "server")]
    pub use crate::server::{
        Handler, HandlerResult, Middleware, MiddlewareVerdict, Server, ServerConfig,
    };

    #[cfg(feature = "registry")]
    pub use crate::registry::{CallArgs, Entry, Registry};

    #[cfg(feature = "fleet")]
    pub use crate::fleet::{Fleet, NodeConfig, RemoteResult, RetryPolicy};

    #[cfg(feature = "uniudp")]
    pub use crate::uniudp::{
        Reassembler, SendOptions, UniUdpClient, UniUdpConfig, UniUdpFleet, UniUdpServer,
    };
}
