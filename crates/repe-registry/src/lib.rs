//! # repe-registry
//!
//! A JSON-Pointer-addressed tree of values, callables, and nested
//! mappings, served over REPE. The body of a request selects the
//! operation: empty body reads, a body aimed at a callable calls it,
//! anything else writes.
//!
//! ## Example
//!
//! ```
//! use repe_registry::{CallArgs, Registry};
//! use serde_json::{json, Value};
//!
//! let registry = Registry::new();
//! registry.register("/counter", json!(0)).unwrap();
//! registry
//!     .register_fn("/add", |args| match args {
//!         CallArgs::Named(map) => {
//!             let a = map.get("a").and_then(Value::as_i64).unwrap_or(0);
//!             let b = map.get("b").and_then(Value::as_i64).unwrap_or(0);
//!             Ok(json!(a + b))
//!         }
//!         _ => Ok(Value::Null),
//!     })
//!     .unwrap();
//!
//! assert_eq!(registry.read("/counter").unwrap(), json!(0));
//! registry.write("/counter", json!(42)).unwrap();
//! assert_eq!(registry.read("/counter").unwrap(), json!(42));
//! ```

pub mod error;
pub mod pointer;
pub mod registry;
pub mod serve;

pub use error::{RegistryError, Result};
pub use pointer::parse_pointer;
pub use registry::{CallArgs, Callable, Entry, Registry};
pub use serve::{serve, RegistryMiddleware};
