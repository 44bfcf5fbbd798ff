use log::{debug, warn};

use crate::device::constants::MAX_LINE_LENGTH;

/// Accumulates raw bytes from the port and hands out complete lines.
///
/// Bytes are kept until a `\n` arrives so that multi-byte utf-8 sequences split across reads are
/// decoded intact. Once an unterminated line grows past `max_length` the rest of that line, up to
/// and including its `\n`, is dropped as well.
pub struct LineBuffer {
    pending: Vec<u8>,
    max_length: usize,
    discarding: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        LineBuffer {
            pending: Vec::with_capacity(max_length),
            max_length,
            discarding: false,
        }
    }

    /// Append a chunk and return every line it completed, trimmed. Empty lines are skipped.
    pub fn push(&mut self, mut chunk: &[u8]) -> Vec<String> {
        if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    debug!("Dropped the remainder of an overlong line");
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return Vec::new(),
            }
        }
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw[..end]);
            let line = line.trim();

            if line.is_empty() {
                debug!("Skipping empty line");
                continue;
            }
            lines.push(line.to_string());
        }

        if self.pending.len() > self.max_length {
            warn!("Discarding {} bytes of input without a line terminator", self.pending.len());
            self.pending.clear();
            self.discarding = true;
        }

        lines
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
