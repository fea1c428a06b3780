//! # repe-protocol
//!
//! Wire layer of the REPE RPC stack: the fixed 48-byte little-endian header,
//! message framing, format-tagged body encoding, and the wire error
//! taxonomy.
//!
//! Every other crate in the workspace builds on these types. The crate is
//! transport-agnostic - it never touches a socket.
//!
//! ## Example
//!
//! ```
//! use repe_protocol::{BodyFormat, Message};
//!
//! let request = Message::request(1, "/add", b"{\"a\":5,\"b\":3}".to_vec(), BodyFormat::Json);
//! let bytes = request.to_bytes();
//! let decoded = Message::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded.parse_query().unwrap(), "/add");
//! ```

pub mod body;
pub mod error;
pub mod error_code;
pub mod format;
pub mod header;
pub mod message;

pub use body::{BinaryValueCodec, Body, BodyCodec};
pub use error::{ProtocolError, Result};
pub use error_code::ErrorCode;
pub use format::{BodyFormat, QueryFormat};
pub use header::{Header, HEADER_LENGTH, REPE_SPEC, REPE_VERSION};
pub use message::Message;
