// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock backend for deterministic testing.
//!
//! `MockBackend` implements [`Backend`] with per-endpoint FIFO scripts. Every
//! call is recorded before it is answered, and an endpoint can be held on a
//! gate so tests can observe an outstanding request.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use tokio::sync::{Mutex, Notify};

use murmur_core::types::{
    AgentPersona, ConversationRecord, CounterpartRecord, Escalation, HistoryMessage,
    KnowledgeDraft, KnowledgeReceipt, SimpleReply,
};
use murmur_core::{
    AgentId, Backend, ByteStream, ConversationCategory, ConversationId, EscalationId, Layer,
    MurmurError,
};

use crate::frames;

/// The backend operations, for gating and filtering recorded calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListConversations,
    StartChat,
    LoadHistory,
    SendStreaming,
    SendSimple,
    ListEscalations,
    MarkAnswered,
    Decline,
    PublishKnowledge,
}

/// One recorded backend call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListConversations(ConversationCategory),
    StartChat(AgentId),
    LoadHistory(ConversationId),
    SendStreaming {
        conversation_id: ConversationId,
        content: String,
    },
    SendSimple {
        agent_id: AgentId,
        content: String,
        conversation_id: Option<ConversationId>,
    },
    ListEscalations,
    MarkAnswered {
        escalation_id: EscalationId,
        answer: String,
        layer: Layer,
    },
    Decline(EscalationId),
    PublishKnowledge(KnowledgeDraft),
}

impl Call {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Call::ListConversations(_) => Endpoint::ListConversations,
            Call::StartChat(_) => Endpoint::StartChat,
            Call::LoadHistory(_) => Endpoint::LoadHistory,
            Call::SendStreaming { .. } => Endpoint::SendStreaming,
            Call::SendSimple { .. } => Endpoint::SendSimple,
            Call::ListEscalations => Endpoint::ListEscalations,
            Call::MarkAnswered { .. } => Endpoint::MarkAnswered,
            Call::Decline(_) => Endpoint::Decline,
            Call::PublishKnowledge(_) => Endpoint::PublishKnowledge,
        }
    }
}

/// Body of one scripted streamed reply.
pub struct StreamScript {
    chunks: Vec<Result<Bytes, MurmurError>>,
    hang: bool,
}

impl StreamScript {
    /// Start frame, the tokens, then a complete frame carrying `message_id`.
    pub fn reply(tokens: &[&str], message_id: &str) -> Self {
        Self::chunks(frames::reply(tokens, message_id))
    }

    pub fn chunks(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Ok).collect(),
            hang: false,
        }
    }

    /// Keeps the connection open after the last chunk, like a stalled server.
    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Ends the body with a transport error.
    pub fn then_fail(mut self, error: MurmurError) -> Self {
        self.chunks.push(Err(error));
        self
    }

    fn into_stream(self) -> ByteStream {
        let body = stream::iter(self.chunks);
        if self.hang {
            Box::pin(body.chain(stream::pending()))
        } else {
            Box::pin(body)
        }
    }
}

/// The transport error an offline client sees.
pub fn offline() -> MurmurError {
    MurmurError::Transport {
        message: "connection refused".to_string(),
        source: None,
    }
}

#[derive(Default)]
struct Script {
    conversations: VecDeque<Result<Vec<ConversationRecord>, MurmurError>>,
    start_chat: VecDeque<Result<ConversationRecord, MurmurError>>,
    history: VecDeque<Result<Vec<HistoryMessage>, MurmurError>>,
    streams: VecDeque<Result<StreamScript, MurmurError>>,
    simple: VecDeque<Result<SimpleReply, MurmurError>>,
    escalations: VecDeque<Result<Vec<Escalation>, MurmurError>>,
    mark_answered: VecDeque<Result<(), MurmurError>>,
    decline: VecDeque<Result<(), MurmurError>>,
    publish: VecDeque<Result<KnowledgeReceipt, MurmurError>>,
}

/// A backend that answers from per-endpoint scripts.
///
/// When an endpoint's script is empty a neutral default is returned: empty
/// lists, `Ok(())`, a one-token streamed reply.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<Endpoint, Arc<Notify>>>,
    session_ended: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_conversations(&self, result: Result<Vec<ConversationRecord>, MurmurError>) {
        self.script.lock().await.conversations.push_back(result);
    }

    pub async fn push_start_chat(&self, result: Result<ConversationRecord, MurmurError>) {
        self.script.lock().await.start_chat.push_back(result);
    }

    pub async fn push_history(&self, result: Result<Vec<HistoryMessage>, MurmurError>) {
        self.script.lock().await.history.push_back(result);
    }

    pub async fn push_stream(&self, result: Result<StreamScript, MurmurError>) {
        self.script.lock().await.streams.push_back(result);
    }

    pub async fn push_simple(&self, result: Result<SimpleReply, MurmurError>) {
        self.script.lock().await.simple.push_back(result);
    }

    pub async fn push_escalations(&self, result: Result<Vec<Escalation>, MurmurError>) {
        self.script.lock().await.escalations.push_back(result);
    }

    pub async fn push_mark_answered(&self, result: Result<(), MurmurError>) {
        self.script.lock().await.mark_answered.push_back(result);
    }

    pub async fn push_decline(&self, result: Result<(), MurmurError>) {
        self.script.lock().await.decline.push_back(result);
    }

    pub async fn push_publish(&self, result: Result<KnowledgeReceipt, MurmurError>) {
        self.script.lock().await.publish.push_back(result);
    }

    /// Holds every later call to `endpoint` until the returned gate is notified once per call.
    pub async fn hold(&self, endpoint: Endpoint) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().await.insert(endpoint, Arc::clone(&gate));
        gate
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .cloned()
            .collect()
    }

    /// Waits until `endpoint` has been called `count` times.
    ///
    /// # Panics
    ///
    /// Panics after two seconds without reaching `count`.
    pub async fn wait_for_calls(&self, endpoint: Endpoint, count: usize) {
        let wait = async {
            while self.calls_to(endpoint).await.len() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(2), wait).await.is_err() {
            panic!("timed out waiting for {count} call(s) to {endpoint:?}");
        }
    }

    /// Whether [`Backend::end_session`] has been called.
    pub fn session_ended(&self) -> bool {
        self.session_ended.load(Ordering::SeqCst)
    }

    async fn record(&self, call: Call) {
        let endpoint = call.endpoint();
        self.calls.lock().await.push(call);
        let gate = self.gates.lock().await.get(&endpoint).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

fn default_record(agent_id: &AgentId) -> ConversationRecord {
    ConversationRecord {
        id: ConversationId::from(format!("conv-{agent_id}")),
        category: ConversationCategory::DirectChat,
        counterpart: CounterpartRecord::Agent(AgentPersona {
            id: agent_id.clone(),
            name: format!("Agent {agent_id}"),
            handle: None,
            avatar_url: None,
        }),
        last_message_at: None,
        last_message_preview: None,
        unread_count: 0,
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    async fn list_conversations(
        &self,
        category: ConversationCategory,
    ) -> Result<Vec<ConversationRecord>, MurmurError> {
        self.record(Call::ListConversations(category)).await;
        self.script
            .lock()
            .await
            .conversations
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn start_chat(&self, agent_id: &AgentId) -> Result<ConversationRecord, MurmurError> {
        self.record(Call::StartChat(agent_id.clone())).await;
        self.script
            .lock()
            .await
            .start_chat
            .pop_front()
            .unwrap_or_else(|| Ok(default_record(agent_id)))
    }

    async fn load_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<HistoryMessage>, MurmurError> {
        self.record(Call::LoadHistory(conversation_id.clone())).await;
        self.script
            .lock()
            .await
            .history
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_streaming(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<ByteStream, MurmurError> {
        self.record(Call::SendStreaming {
            conversation_id: conversation_id.clone(),
            content: content.to_string(),
        })
        .await;
        let script = self
            .script
            .lock()
            .await
            .streams
            .pop_front()
            .unwrap_or_else(|| Ok(StreamScript::reply(&["mock reply"], "mock-msg")))?;
        Ok(script.into_stream())
    }

    async fn send_simple(
        &self,
        agent_id: &AgentId,
        content: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<SimpleReply, MurmurError> {
        self.record(Call::SendSimple {
            agent_id: agent_id.clone(),
            content: content.to_string(),
            conversation_id: conversation_id.cloned(),
        })
        .await;
        self.script
            .lock()
            .await
            .simple
            .pop_front()
            .unwrap_or_else(|| {
                Ok(SimpleReply {
                    conversation_id: conversation_id
                        .cloned()
                        .unwrap_or_else(|| ConversationId::from(format!("conv-{agent_id}"))),
                    answer: "mock answer".to_string(),
                    layer_used: Layer::Public,
                })
            })
    }

    async fn list_escalations(&self) -> Result<Vec<Escalation>, MurmurError> {
        self.record(Call::ListEscalations).await;
        self.script
            .lock()
            .await
            .escalations
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn mark_escalation_answered(
        &self,
        escalation_id: &EscalationId,
        answer: &str,
        layer: Layer,
    ) -> Result<(), MurmurError> {
        self.record(Call::MarkAnswered {
            escalation_id: escalation_id.clone(),
            answer: answer.to_string(),
            layer,
        })
        .await;
        self.script
            .lock()
            .await
            .mark_answered
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn decline_escalation(&self, escalation_id: &EscalationId) -> Result<(), MurmurError> {
        self.record(Call::Decline(escalation_id.clone())).await;
        self.script
            .lock()
            .await
            .decline
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn publish_knowledge(
        &self,
        draft: &KnowledgeDraft,
    ) -> Result<KnowledgeReceipt, MurmurError> {
        self.record(Call::PublishKnowledge(draft.clone())).await;
        self.script
            .lock()
            .await
            .publish
            .pop_front()
            .unwrap_or_else(|| {
                Ok(KnowledgeReceipt {
                    id: Some("knowledge-1".to_string()),
                })
            })
    }

    async fn end_session(&self) {
        self.session_ended.store(true, Ordering::SeqCst);
    }
}
