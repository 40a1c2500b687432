// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoder for the reply stream of a streamed send.
//!
//! The body is a sequence of newline-separated frames; meaningful frames are
//! prefixed with `data: ` and carry one JSON object. [`decode_stream`] turns
//! a raw [`ByteStream`] into typed [`StreamEvent`]s, tolerating frames split
//! across reads and silently skipping noise.

pub mod frame;

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use murmur_core::{ByteStream, MurmurError};
use tracing::debug;

pub use frame::{DATA_PREFIX, FrameDecoder, StreamEvent, classify_line};

/// Typed events decoded from a reply body.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, MurmurError>> + Send>>;

struct DecodeState {
    bytes: ByteStream,
    decoder: FrameDecoder,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

/// Wraps a byte stream into a stream of [`StreamEvent`]s.
///
/// Events are yielded strictly in arrival order. When the byte stream ends,
/// any unterminated trailing line is flushed before the event stream ends.
/// A transport error is yielded once and ends the stream.
pub fn decode_stream(bytes: ByteStream) -> EventStream {
    let state = DecodeState {
        bytes,
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let decoded = state.decoder.push(&chunk);
                    state.pending.extend(decoded);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if state.decoder.pending_bytes() > 0 {
                        debug!(
                            bytes = state.decoder.pending_bytes(),
                            "stream ended mid-line, flushing"
                        );
                    }
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    });

    Box::pin(events)
}
