// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request bodies for the Murmur HTTP API.

use murmur_core::{AgentId, ConversationId, Layer};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct StartChatBody<'a> {
    pub agent_id: &'a AgentId,
}

#[derive(Debug, Serialize)]
pub(crate) struct StreamBody<'a> {
    pub conversation_id: &'a ConversationId,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SimpleBody<'a> {
    pub agent_id: &'a AgentId,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a ConversationId>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkAnsweredBody<'a> {
    pub answer: &'a str,
    pub layer: Layer,
}
