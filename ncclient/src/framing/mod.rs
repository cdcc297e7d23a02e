//! NETCONF message framing.
//!
//! An SSH channel is a plain byte stream, so every NETCONF message needs an
//! explicit boundary. [`Framing`] converts between bare XML text and its
//! on-wire form over an accumulating [`BytesMut`] buffer; the session owns
//! the buffer and the read loop, the framing only looks at bytes.

mod end_of_message;

pub use end_of_message::{DEFAULT_MAX_FRAME_SIZE, EndOfMessageFraming};

use std::fmt;

use bytes::BytesMut;

use crate::error::ProtocolError;

/// End-of-message marker used by NETCONF 1.0 framing.
pub const DELIMITER: &str = "]]>]]>";

/// Encoder/decoder for one NETCONF framing mechanism.
///
/// One instance belongs to one session; implementations may keep scan state
/// between calls to [`decode`](Framing::decode).
pub trait Framing: Send + Sync + fmt::Debug {
    /// Append the on-wire representation of `message` to `dst`.
    fn encode(&self, message: &str, dst: &mut BytesMut) -> Result<(), ProtocolError>;

    /// Try to take one complete message off the front of `src`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Bytes that belong to a
    /// following message stay in `src`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError>;

    /// Forget any partial scan state, e.g. after the buffer was discarded.
    fn reset(&mut self) {}
}
