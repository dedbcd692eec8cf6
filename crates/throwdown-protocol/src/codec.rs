//! Line framing for the text protocol.
//!
//! The wire format is newline-terminated text in both directions. Reads
//! arrive in arbitrary chunks, so each connection owns a [`LineCodec`]
//! that buffers the trailing partial line between chunks.

use crate::ProtocolError;

/// Default upper bound on a single line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Incremental newline splitter for one connection.
#[derive(Debug, Clone)]
pub struct LineCodec {
    buf: Vec<u8>,
    max_line_len: usize,
    /// Dropping the rest of an over-long line until its newline arrives.
    discarding: bool,
}

impl LineCodec {
    /// Creates a codec that rejects lines longer than `max_line_len`.
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len,
            discarding: false,
        }
    }

    /// Feeds one chunk of bytes and returns every line it completed.
    ///
    /// Lines are decoded lossily as UTF-8 and have trailing whitespace
    /// (including `\r`) removed. A line that exceeds the limit is replaced
    /// by a [`ProtocolError::LineTooLong`] entry and its bytes are dropped;
    /// framing resumes after the next newline.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Result<String, ProtocolError>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            let len = raw.len() - 1;
            if len > self.max_line_len {
                out.push(Err(ProtocolError::LineTooLong {
                    len,
                    max: self.max_line_len,
                }));
                continue;
            }
            let text = String::from_utf8_lossy(&raw[..len]);
            out.push(Ok(text.trim_end().to_string()));
        }

        if self.buf.len() > self.max_line_len {
            if !self.discarding {
                out.push(Err(ProtocolError::LineTooLong {
                    len: self.buf.len(),
                    max: self.max_line_len,
                }));
            }
            self.discarding = true;
            self.buf.clear();
        }
        out
    }

    /// Number of bytes held for an unfinished line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Terminates `text` with a newline unless it already ends in one.
    pub fn frame(text: &str) -> String {
        if text.ends_with('\n') {
            text.to_string()
        } else {
            format!("{text}\n")
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}
