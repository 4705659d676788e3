// crates/client/src/sse.rs
//! Incremental decoder for the `text/event-stream` wire format used by the
//! job progress endpoint.
//!
//! The service emits one `data: <json>` frame per status change, plus
//! `: keepalive` comment lines roughly once a second. Frames can arrive
//! split across arbitrary chunk boundaries, so the decoder buffers partial
//! lines between [`SseDecoder::push`] calls.

/// One dispatched event: the joined `data` payload and the optional
/// `event` name (the job service never sets one, but the format allows it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Streaming SSE decoder. Feed raw chunks in, get completed frames out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let mut line = String::from_utf8_lossy(&line[..newline]).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            // Blank line dispatches the accumulated event, if any.
            if self.data_lines.is_empty() {
                self.event = None;
                return None;
            }
            let frame = SseFrame {
                event: self.event.take(),
                data: self.data_lines.join("\n"),
            };
            self.data_lines.clear();
            return Some(frame);
        }

        // Comment line (the service's keepalive heartbeat).
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            // A field name with no colon is valid SSE: empty value.
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id/retry and unknown fields carry nothing we use.
            _ => {}
        }
        None
    }
}
