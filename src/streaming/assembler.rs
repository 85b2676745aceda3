//! Reassembles SSE frames from arbitrarily split byte chunks.

use crate::error::{ChatError, Result};

/// Longest line accepted before the stream is treated as broken.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One protocol unit: an event type plus its data lines joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

/// Incremental line/frame splitter.
///
/// The pending tail is kept as raw bytes and only complete lines are decoded,
/// so a UTF-8 sequence split across two chunks is joined before decoding.
#[derive(Debug)]
pub struct FrameAssembler {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    max_line: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            event: None,
            data: Vec::new(),
            max_line,
        }
    }

    /// Feed one raw chunk and return every frame it completed, in order.
    ///
    /// Fails with [`ChatError::Network`] once an unterminated line grows past
    /// the line limit.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        self.pending.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.pending[start..end]).into_owned();
            start = end + 1;
            if let Some(frame) = self.push_line(&line) {
                frames.push(frame);
            }
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            return Err(ChatError::Network(format!(
                "line exceeds {} bytes without a newline",
                self.max_line
            )));
        }
        Ok(frames)
    }

    /// Bytes received but not yet terminated by a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn push_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.close_frame();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id, retry and unknown fields carry nothing we use
            _ => {}
        }
        None
    }

    fn close_frame(&mut self) -> Option<Frame> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        match event {
            Some(event) if !data.is_empty() => Some(Frame {
                event,
                data: data.join("\n"),
            }),
            Some(event) => {
                tracing::debug!(%event, "discarding frame without data");
                None
            }
            None if !data.is_empty() => {
                tracing::debug!("discarding frame without event type");
                None
            }
            None => None,
        }
    }
}
