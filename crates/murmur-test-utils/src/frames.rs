// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for reply-stream bodies.

use bytes::Bytes;

pub fn start() -> Bytes {
    Bytes::from_static(b"data: {\"event\":\"start\",\"model\":\"mock\"}\n")
}

pub fn token(text: &str) -> Bytes {
    let frame = serde_json::json!({ "token": text });
    Bytes::from(format!("data: {frame}\n"))
}

pub fn complete(message_id: &str) -> Bytes {
    let frame = serde_json::json!({ "event": "complete", "message_id": message_id });
    Bytes::from(format!("data: {frame}\n"))
}

pub fn error(detail: &str) -> Bytes {
    let frame = serde_json::json!({ "error": detail });
    Bytes::from(format!("data: {frame}\n"))
}

/// A whole reply: start, one frame per token, complete.
pub fn reply(tokens: &[&str], message_id: &str) -> Vec<Bytes> {
    let mut chunks = vec![start()];
    chunks.extend(tokens.iter().map(|t| token(t)));
    chunks.push(complete(message_id));
    chunks
}
