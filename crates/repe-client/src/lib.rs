//! # repe-client
//!
//! Multiplexing REPE client: one TCP connection, many in-flight requests,
//! correlated to their responses by id by a background reader task.
//!
//! ## Example
//!
//! ```no_run
//! use repe_client::{Client, ClientConfig};
//! use repe_protocol::Body;
//! use serde_json::json;
//!
//! # async fn demo() -> repe_client::Result<()> {
//! let client = Client::new(ClientConfig::new("127.0.0.1", 5510));
//! client.connect().await?;
//! let result = client
//!     .send_request("/add", &Body::Value(json!({"a": 5, "b": 3})))
//!     .await?;
//! println!("{:?}", result);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{await_batch, Client, RequestHandle, RequestOptions};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
