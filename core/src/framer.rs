//! Delimiter framing over a raw byte stream.
//!
//! Feed bytes as they arrive from the socket; every delimiter yields one
//! frame made of everything buffered before it. A trailing fragment with no
//! delimiter stays buffered until a later read completes it.
//!
//! The delimiter must never occur inside a payload. That is a protocol
//! constraint on the sender and is not checked here.

pub const DEFAULT_DELIMITER: u8 = b'$';

#[derive(Debug)]
pub struct Framer {
    delimiter: u8,
    buf:       Vec<u8>,
    /// Prefix of `buf` already searched; it holds no delimiter.
    scanned:   usize,
}

impl Framer {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter, buf: Vec::new(), scanned: 0 }
    }

    /// Append `bytes` and return every frame completed by them, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();

        // Resume past the retained partial, then drain consumed bytes in a
        // single move.
        let mut start = 0;
        let mut cursor = self.scanned;
        while let Some(offset) = self.buf[cursor..].iter().position(|&b| b == self.delimiter) {
            let end = cursor + offset;
            frames.push(self.buf[start..end].to_vec());
            start = end + 1;
            cursor = start;
        }
        if start > 0 {
            self.buf.drain(..start);
        }
        self.scanned = self.buf.len();

        frames
    }

    /// Drop any partial frame. Called when a connection ends.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }

    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}
