// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame classification and the incremental line framer.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

/// Marker every meaningful line starts with.
pub const DATA_PREFIX: &str = "data: ";

/// Typed events carried by the reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Generation started; the backend has accepted the user's message.
    Start { model: Option<String> },
    /// The next piece of the agent's reply.
    Token(String),
    /// Generation finished; `message_id` is the server id of the reply.
    Complete { message_id: Option<String> },
    /// The backend aborted generation with an in-band error.
    Error { message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrame {
    event: Option<String>,
    token: Option<String>,
    model: Option<String>,
    message_id: Option<Value>,
    error: Option<Value>,
}

/// Classifies one complete line.
///
/// Returns `None` for unmarked lines, keep-alives, `[DONE]` sentinels,
/// malformed JSON and unknown frame shapes; all of these are noise.
pub fn classify_line(line: &str) -> Option<StreamEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let frame: RawFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(e) => {
            trace!(error = %e, "skipping unparseable frame");
            return None;
        }
    };

    if let Some(token) = frame.token {
        return Some(StreamEvent::Token(token));
    }

    match frame.event.as_deref() {
        Some("start") => return Some(StreamEvent::Start { model: frame.model }),
        Some("complete") => {
            return Some(StreamEvent::Complete {
                message_id: frame.message_id.and_then(scalar_to_string),
            });
        }
        _ => {}
    }

    frame.error.map(|error| StreamEvent::Error {
        message: error_message(error),
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_message(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map).to_string()),
        other => other.to_string(),
    }
}

/// Incremental framer: buffers bytes across reads and yields events for complete lines only.
///
/// Bytes are only decoded as UTF-8 once a full line is available, so a
/// multi-byte character split across two reads is reassembled intact.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Bytes at the front of `buffer` already known to contain no newline.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one read's worth of bytes; returns the events of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut line_start = 0;
        let mut cursor = self.scanned;
        while let Some(offset) = self.buffer[cursor..].iter().position(|b| *b == b'\n') {
            let line_end = cursor + offset;
            if let Some(event) = decode_line(&self.buffer[line_start..line_end]) {
                events.push(event);
            }
            line_start = line_end + 1;
            cursor = line_start;
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();
        events
    }

    /// Flushes the trailing line left when the connection closed without a final newline.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        decode_line(&rest)
    }

    /// Number of buffered bytes waiting for a newline.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<StreamEvent> {
    if bytes.is_empty() {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(line) => classify_line(line),
        Err(e) => {
            trace!(error = %e, "skipping line with invalid UTF-8");
            None
        }
    }
}
