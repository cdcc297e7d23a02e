//! NETCONF 1.0 end-of-message framing (RFC 4742).
//!
//! A message goes on the wire verbatim followed by `]]>]]>`. Decoding scans
//! the buffer for the marker; like a tail search, bytes that were already
//! scanned are not scanned again except for the last `DELIMITER.len() - 1`,
//! which is where a marker split across two reads can start.
//!
//! Servers usually put the marker on a line of its own. The line ending that
//! follows a marker belongs to it, so one `\n` or `\r\n` right after the
//! marker is dropped, even when it arrives in a later read.

use bytes::{Buf, BytesMut};
use memchr::memmem::Finder;

use super::{DELIMITER, Framing};
use crate::error::ProtocolError;

/// Largest frame accepted by default (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// `]]>]]>` delimited framing.
#[derive(Debug, Clone)]
pub struct EndOfMessageFraming {
    finder: Finder<'static>,

    /// Number of bytes at the front of the buffer known not to contain a
    /// complete marker.
    scanned: usize,

    /// A marker was consumed and its line ending has not been seen yet.
    pending_line_end: bool,

    max_frame_size: usize,
}

impl EndOfMessageFraming {
    /// Create a codec with the default frame size limit.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a codec that rejects frames larger than `max_frame_size`.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            finder: Finder::new(DELIMITER.as_bytes()),
            scanned: 0,
            pending_line_end: false,
            max_frame_size,
        }
    }

    /// Configured frame size limit.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Drop the line ending of the previous marker line.
    ///
    /// Returns `false` while more bytes are needed to decide.
    fn skip_line_end(&mut self, src: &mut BytesMut) -> bool {
        if !self.pending_line_end {
            return true;
        }
        match src.first().copied() {
            None => return false,
            Some(b'\n') => src.advance(1),
            Some(b'\r') => match src.get(1).copied() {
                None => return false,
                Some(b'\n') => src.advance(2),
                Some(_) => {}
            },
            Some(_) => {}
        }
        self.pending_line_end = false;
        true
    }
}

impl Default for EndOfMessageFraming {
    fn default() -> Self {
        Self::new()
    }
}

impl Framing for EndOfMessageFraming {
    fn encode(&self, message: &str, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        if self.finder.find(message.as_bytes()).is_some() {
            return Err(ProtocolError::DelimiterInPayload);
        }
        dst.reserve(message.len() + DELIMITER.len());
        dst.extend_from_slice(message.as_bytes());
        dst.extend_from_slice(DELIMITER.as_bytes());
        Ok(())
    }

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        if !self.skip_line_end(src) {
            return Ok(None);
        }

        let start = self
            .scanned
            .min(src.len())
            .saturating_sub(DELIMITER.len() - 1);

        match self.finder.find(&src[start..]) {
            Some(offset) => {
                let frame = src.split_to(start + offset);
                src.advance(DELIMITER.len());
                self.scanned = 0;
                self.pending_line_end = true;
                match std::str::from_utf8(&frame) {
                    Ok(text) => Ok(Some(text.to_owned())),
                    Err(e) => Err(ProtocolError::InvalidUtf8 {
                        offset: e.valid_up_to(),
                    }),
                }
            }
            None => {
                if src.len() > self.max_frame_size {
                    return Err(ProtocolError::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.pending_line_end = false;
    }
}
