// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeline messages and their lifecycle state machine.
//!
//! ```text
//! Optimistic ──► Streaming ──► Finalized
//!     │              │
//!     └──────────────┴──► Failed (removed from the timeline)
//! ```
//!
//! `Optimistic` may also go straight to `Finalized` once the backend confirms
//! a user message. Nothing leaves `Finalized` or `Failed`.

use std::fmt;

use chrono::{DateTime, Utc};
use murmur_core::{ConversationId, ErrorKind, MessageId, MurmurError, Role};

/// Why a message left the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The user aborted the send.
    Canceled,
    /// The send failed; `kind` tells the UI how to present it.
    Error { kind: ErrorKind, message: String },
}

impl FailureReason {
    pub fn from_error(error: &MurmurError) -> Self {
        match error {
            MurmurError::Canceled => FailureReason::Canceled,
            other => FailureReason::Error {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, FailureReason::Canceled)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Canceled => f.write_str("canceled"),
            FailureReason::Error { message, .. } => f.write_str(message),
        }
    }
}

/// Lifecycle state of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageState {
    /// Created on the client, not yet confirmed by the backend.
    Optimistic,
    /// Content is being appended token by token.
    Streaming,
    /// Id and content are frozen.
    Finalized,
    /// Removed from the timeline.
    Failed(FailureReason),
}

impl MessageState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_become(&self, next: &MessageState) -> bool {
        use MessageState::*;
        matches!(
            (self, next),
            (Optimistic, Streaming)
                | (Optimistic, Finalized)
                | (Streaming, Finalized)
                | (Optimistic, Failed(_))
                | (Streaming, Failed(_))
        )
    }

    /// In-flight messages survive a history reload.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, MessageState::Optimistic | MessageState::Streaming)
    }

    fn label(&self) -> &'static str {
        match self {
            MessageState::Optimistic => "optimistic",
            MessageState::Streaming => "streaming",
            MessageState::Finalized => "finalized",
            MessageState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a conversation timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    validated: Option<bool>,
    state: MessageState,
    /// Insertion sequence; breaks created_at ties.
    seq: u64,
}

impl Message {
    pub(crate) fn new(
        id: MessageId,
        conversation_id: ConversationId,
        role: Role,
        content: String,
        created_at: DateTime<Utc>,
        state: MessageState,
        seq: u64,
    ) -> Self {
        Self {
            id,
            conversation_id,
            role,
            content,
            created_at,
            validated: None,
            state,
            seq,
        }
    }

    pub(crate) fn with_validated(mut self, validated: Option<bool>) -> Self {
        self.validated = validated;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `Some(true)` when a human reviewed the answer, `Some(false)` for raw AI output.
    pub fn validated(&self) -> Option<bool> {
        self.validated
    }

    pub fn state(&self) -> &MessageState {
        &self.state
    }

    pub(crate) fn sort_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }

    pub(crate) fn set_id(&mut self, id: MessageId) {
        self.id = id;
    }

    pub(crate) fn push_token(&mut self, token: &str) -> Result<(), MurmurError> {
        if self.state != MessageState::Streaming {
            return Err(MurmurError::InvalidState(format!(
                "cannot append to {} message {}",
                self.state, self.id
            )));
        }
        self.content.push_str(token);
        Ok(())
    }

    pub(crate) fn transition(&mut self, next: MessageState) -> Result<(), MurmurError> {
        if !self.state.can_become(&next) {
            return Err(MurmurError::InvalidState(format!(
                "message {} cannot go from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}
