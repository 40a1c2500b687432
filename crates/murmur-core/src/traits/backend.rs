// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait covering every remote operation the client performs.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;

use crate::error::MurmurError;
use crate::types::{
    AgentId, ConversationCategory, ConversationId, ConversationRecord, Escalation, EscalationId,
    HistoryMessage, KnowledgeDraft, KnowledgeReceipt, Layer, SimpleReply,
};

/// Raw response body of a streamed send, chunked however the transport delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, MurmurError>> + Send>>;

/// Remote API of the social platform.
///
/// Every method is a single request; non-2xx responses surface as
/// [`MurmurError::Http`] with the response body as detail.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Human-readable name of this backend (for logs).
    fn name(&self) -> &str;

    /// Lists conversations of one category.
    async fn list_conversations(
        &self,
        category: ConversationCategory,
    ) -> Result<Vec<ConversationRecord>, MurmurError>;

    /// Opens (or returns the existing) direct chat with an agent.
    async fn start_chat(&self, agent_id: &AgentId) -> Result<ConversationRecord, MurmurError>;

    /// Loads the server-ordered message history of a conversation.
    async fn load_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<HistoryMessage>, MurmurError>;

    /// Posts a message and returns the live response body.
    async fn send_streaming(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<ByteStream, MurmurError>;

    /// Posts a message on the non-streamed path and waits for the full answer.
    async fn send_simple(
        &self,
        agent_id: &AgentId,
        content: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<SimpleReply, MurmurError>;

    /// Lists the escalation queue (pending, answered and declined items).
    async fn list_escalations(&self) -> Result<Vec<Escalation>, MurmurError>;

    /// Marks an escalation answered; the backend notifies the requester.
    async fn mark_escalation_answered(
        &self,
        escalation_id: &EscalationId,
        answer: &str,
        layer: Layer,
    ) -> Result<(), MurmurError>;

    /// Declines an escalation. Irreversible.
    async fn decline_escalation(&self, escalation_id: &EscalationId) -> Result<(), MurmurError>;

    /// Publishes a knowledge artifact scoped to `draft.agent_id`.
    async fn publish_knowledge(
        &self,
        draft: &KnowledgeDraft,
    ) -> Result<KnowledgeReceipt, MurmurError>;

    /// Drops any session state held for the current user, such as a cached
    /// credential. Called once on client teardown.
    async fn end_session(&self) {}
}
