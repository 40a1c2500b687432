// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the timeline, directory, escalation and transport crates.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

/// Unique identifier for an agent persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

/// Unique identifier for an escalation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscalationId(pub String);

macro_rules! string_id {
    ($($name:ident),*) => {$(
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    )*};
}

string_id!(ConversationId, AgentId, EscalationId);

/// Identifier of a message in a timeline.
///
/// Messages created on the client start with a provisional id; it is replaced
/// in place by the server-assigned id once the backend reports one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Provisional(Uuid),
    Server(String),
}

impl MessageId {
    /// Generates a fresh provisional id.
    pub fn provisional() -> Self {
        MessageId::Provisional(Uuid::new_v4())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, MessageId::Provisional(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Provisional(id) => write!(f, "tmp-{id}"),
            MessageId::Server(id) => f.write_str(id),
        }
    }
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    #[strum(to_string = "agent", serialize = "assistant")]
    Agent,
    System,
}

/// The three logical conversation categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationCategory {
    /// A user chatting with an agent persona.
    DirectChat,
    /// A question escalated to the agent's human owner.
    Escalation,
    /// Read-only view of other people's chats with the owner's agent.
    AgentActivity,
}

impl ConversationCategory {
    pub const ALL: [ConversationCategory; 3] = [
        ConversationCategory::DirectChat,
        ConversationCategory::Escalation,
        ConversationCategory::AgentActivity,
    ];
}

/// Access tier gating which knowledge a viewer's chat may draw from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Layer {
    #[default]
    Public,
    Friends,
    Intimate,
}

/// Lifecycle of an escalation. `Answered` and `Declined` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EscalationStatus {
    Pending,
    Answered,
    Declined,
}

impl EscalationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EscalationStatus::Pending)
    }
}

/// An AI persona as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A human profile as returned by the backend.
///
/// For agent-activity rows this is the real identity of the visitor and must
/// only be read by the anonymization step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub handle: Option<String>,
}

/// The other side of a conversation, as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CounterpartRecord {
    Agent(AgentPersona),
    Visitor(VisitorProfile),
}

/// A conversation row as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub category: ConversationCategory,
    pub counterpart: CounterpartRecord,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message_preview: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
}

/// A message row from the history endpoint. Every field may be missing or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryMessage {
    pub id: Option<String>,
    pub role: Option<Role>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_validated: Option<bool>,
}

/// Response of the non-streamed send path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleReply {
    pub conversation_id: ConversationId,
    pub answer: String,
    #[serde(default)]
    pub layer_used: Layer,
}

/// The person whose question was escalated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A question the agent could not answer, offered to its human owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: EscalationId,
    pub agent_id: AgentId,
    pub conversation_id: ConversationId,
    pub requester: Requester,
    pub question: String,
    #[serde(default)]
    pub context_summary: Option<String>,
    pub status: EscalationStatus,
    #[serde(default)]
    pub offered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
}

/// Body of the knowledge publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeDraft {
    #[serde(skip)]
    pub agent_id: AgentId,
    pub title: String,
    pub content: String,
    pub topic: String,
    pub layer: Layer,
    pub is_pinned: bool,
}

/// What the backend returns after publishing knowledge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KnowledgeReceipt {
    #[serde(default)]
    pub id: Option<String>,
}

/// An opaque bearer token with an optional expiry.
///
/// The token is held as a [`SecretString`] and redacted from `Debug` output.
#[derive(Clone)]
pub struct Credential {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_at,
        }
    }

    /// Returns the raw token for attaching to a request header.
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True if the credential expires before `now + skew`.
    pub fn expires_within(&self, now: DateTime<Utc>, skew: chrono::Duration) -> bool {
        match self.expires_at {
            Some(at) => at <= now + skew,
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
