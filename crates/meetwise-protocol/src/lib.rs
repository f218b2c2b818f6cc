//! IPC framing and request/response types for meetwise.
//!
//! This crate defines Protocol v1 for communication between the meetwise
//! CLI and daemon over a Unix socket.
//!
//! # Protocol Overview
//!
//! Messages are sent as length-prefixed JSON:
//! - 4 bytes: message length (u32, big-endian)
//! - N bytes: JSON payload
//!
//! Every message is wrapped in an [`Envelope`] carrying the protocol version
//! and a request id for correlation.
//!
//! # Example
//!
//! ```rust
//! use meetwise_protocol::{Envelope, Request, encode_message, decode_message};
//!
//! let request = Envelope::request("req-123", Request::Ping);
//! let bytes = encode_message(&request).unwrap();
//! let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
//! assert_eq!(decoded.request_id, "req-123");
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_message, encode_message, FrameReader, FrameWriter};
pub use types::{
    AvailabilityQuery, CollaboratorStatus, Envelope, ErrorCode, ErrorResponse, Request, Response,
    StatusInfo,
};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
