//! Splits the raw byte stream into lines.

use bytes::{
    Bytes,
    BytesMut,
};

/// Buffers incoming bytes and hands out complete lines.
///
/// A line ends with `\n`. A `\r` directly in front of it is stripped as well,
/// so a `CR LF` terminated frame comes out without its terminator. Nothing is
/// returned until a terminator was received, and there is no upper bound on
/// how much is buffered while waiting for one.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,

    // everything before this offset is known to not contain a newline
    no_newline_until: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Remove and return the next complete line, without its terminator.
    ///
    /// Returns `None` if no complete line is buffered. In that case nothing is
    /// consumed.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let newline = self.buffer[self.no_newline_until..]
            .iter()
            .position(|byte| *byte == b'\n');

        match newline {
            Some(index) => {
                let index = index + self.no_newline_until;
                let mut line = self.buffer.split_to(index + 1);
                self.no_newline_until = 0;

                line.truncate(index);
                if line.last() == Some(&b'\r') {
                    line.truncate(index - 1);
                }

                Some(line.freeze())
            }
            None => {
                self.no_newline_until = self.buffer.len();
                None
            }
        }
    }

    /// Discard any partially received line.
    ///
    /// Call this when the byte source is closed or switched to another port.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.no_newline_until = 0;
    }

    /// Number of bytes buffered that are not part of a returned line yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
