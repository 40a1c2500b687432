// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation client for Murmur.
//!
//! Coordinates one session: streamed sends with cancellation, history loads
//! de-duplicated by an in-flight guard, the conversation directory with its
//! cache, and the escalation workflow. Front ends hold a
//! [`ConversationClient`] and read state back through its snapshot methods.

pub mod client;
pub mod inflight;
pub mod send;

pub use client::{ConversationClient, LoadOutcome};
pub use inflight::{InflightGuard, InflightTicket};
pub use send::{CANCELED_NOTICE, SendHandle, SendOutcome};
