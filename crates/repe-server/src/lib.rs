//! # repe-server
//!
//! Handler-dispatching REPE server over TCP: accept loop, one task per
//! connection, an ordered middleware chain, and method dispatch by the
//! request query.
//!
//! ## Example
//!
//! ```no_run
//! use repe_server::{HandlerResult, Server, ServerConfig};
//! use repe_protocol::{Body, Message};
//! use serde_json::json;
//!
//! # async fn demo() -> repe_server::Result<()> {
//! let server = Server::new(ServerConfig::new("127.0.0.1", 5510));
//! server.register("/add", |body: Body, _req: Message| async move {
//!     let v = body.as_value().cloned().unwrap_or(json!({}));
//!     let sum = v["a"].as_i64().unwrap_or(0) + v["b"].as_i64().unwrap_or(0);
//!     Ok(HandlerResult::Value(json!({ "result": sum })))
//! });
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use handler::{Handler, HandlerResult, Middleware, MiddlewareVerdict};
pub use server::Server;
