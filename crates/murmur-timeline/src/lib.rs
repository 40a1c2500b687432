// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message timelines for the Murmur client.
//!
//! [`TimelineStore`] holds the ordered messages of every loaded conversation
//! and enforces the message lifecycle. [`Composer`] keeps unsent drafts so a
//! failed send never loses what the user typed.

pub mod composer;
pub mod message;
pub mod store;

pub use composer::Composer;
pub use message::{FailureReason, Message, MessageState};
pub use store::TimelineStore;
