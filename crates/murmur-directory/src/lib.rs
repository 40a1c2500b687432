// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation directory for the Murmur client.
//!
//! Three lists, one per [`ConversationCategory`](murmur_core::ConversationCategory),
//! with search, focus and unread tracking, and the escalation status view.
//! Agent-activity rows are anonymized on the way in, see [`anonymize_activity`].

pub mod anonymize;
pub mod directory;
pub mod summary;

pub use anonymize::{AnonymousIdentity, anonymize_activity};
pub use directory::{Directory, EscalationPartition};
pub use summary::{ConversationSummary, Counterpart, EntryKey, EscalationEntry, truncate_preview};
