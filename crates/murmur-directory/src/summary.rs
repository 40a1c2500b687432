// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation summaries: the rows the directory lists.

use chrono::{DateTime, Utc};
use murmur_core::types::{AgentPersona, ConversationRecord, CounterpartRecord, Escalation};
use murmur_core::{AgentId, ConversationCategory, ConversationId, EscalationId, EscalationStatus};
use serde::{Deserialize, Serialize};

use crate::anonymize::{AnonymousIdentity, anonymize_activity};

/// Who a conversation is with, as the client is allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Counterpart {
    Agent {
        id: AgentId,
        name: String,
        handle: Option<String>,
    },
    Person {
        display_name: String,
        handle: Option<String>,
    },
    Anonymous(AnonymousIdentity),
}

impl Counterpart {
    pub(crate) fn from_persona(persona: AgentPersona) -> Self {
        Counterpart::Agent {
            id: persona.id,
            name: persona.name,
            handle: persona.handle,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Counterpart::Agent { name, .. } => name,
            Counterpart::Person { display_name, .. } => display_name,
            Counterpart::Anonymous(identity) => &identity.label,
        }
    }

    pub fn handle(&self) -> Option<&str> {
        match self {
            Counterpart::Agent { handle, .. } | Counterpart::Person { handle, .. } => {
                handle.as_deref()
            }
            Counterpart::Anonymous(_) => None,
        }
    }

    /// The agent on the other side, if the counterpart is one.
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            Counterpart::Agent { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Escalation state carried by rows of the escalation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationEntry {
    pub id: EscalationId,
    pub status: EscalationStatus,
}

/// One row of a directory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub category: ConversationCategory,
    pub counterpart: Counterpart,
    pub last_message_at: Option<DateTime<Utc>>,
    pub preview: Option<String>,
    pub unread_count: u32,
    pub escalation: Option<EscalationEntry>,
}

/// Identity of a row. Escalation rows are keyed by escalation, chats by conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Conversation(ConversationId),
    Escalation(EscalationId),
}

impl ConversationSummary {
    /// Builds a summary from a backend record.
    ///
    /// Agent-activity records always pass through [`anonymize_activity`].
    pub fn from_record(record: ConversationRecord, preview_chars: usize) -> Self {
        if record.category == ConversationCategory::AgentActivity {
            return anonymize_activity(record, preview_chars);
        }
        let counterpart = match record.counterpart {
            CounterpartRecord::Agent(persona) => Counterpart::from_persona(persona),
            CounterpartRecord::Visitor(profile) => Counterpart::Person {
                display_name: profile.display_name,
                handle: profile.handle,
            },
        };
        Self {
            id: record.id,
            category: record.category,
            counterpart,
            last_message_at: record.last_message_at,
            preview: record
                .last_message_preview
                .map(|p| truncate_preview(&p, preview_chars)),
            unread_count: record.unread_count,
            escalation: None,
        }
    }

    /// Builds an escalation-list row.
    pub fn from_escalation(escalation: &Escalation, preview_chars: usize) -> Self {
        let display_name = escalation
            .requester
            .display_name
            .clone()
            .unwrap_or_else(|| "Someone".to_string());
        Self {
            id: escalation.conversation_id.clone(),
            category: ConversationCategory::Escalation,
            counterpart: Counterpart::Person {
                display_name,
                handle: None,
            },
            last_message_at: escalation.offered_at,
            preview: Some(truncate_preview(&escalation.question, preview_chars)),
            unread_count: 0,
            escalation: Some(EscalationEntry {
                id: escalation.id.clone(),
                status: escalation.status,
            }),
        }
    }

    pub fn key(&self) -> EntryKey {
        match &self.escalation {
            Some(entry) => EntryKey::Escalation(entry.id.clone()),
            None => EntryKey::Conversation(self.id.clone()),
        }
    }

    pub(crate) fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        hit(self.counterpart.display_name())
            || self.counterpart.handle().is_some_and(hit)
            || self.preview.as_deref().is_some_and(hit)
    }
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::types::Requester;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("caf\u{e9} au lait", 8), "caf\u{e9}...");
        assert_eq!(truncate_preview("  padded  ", 10), "padded");
    }

    #[test]
    fn escalation_rows_are_keyed_by_escalation() {
        let escalation = Escalation {
            id: EscalationId::from("e1"),
            agent_id: AgentId::from("a1"),
            conversation_id: ConversationId::from("c1"),
            requester: Requester {
                id: "u1".into(),
                display_name: None,
            },
            question: "Can I bring my dog?".into(),
            context_summary: None,
            status: EscalationStatus::Pending,
            offered_at: None,
            accepted_at: None,
        };
        let row = ConversationSummary::from_escalation(&escalation, 120);
        assert_eq!(row.key(), EntryKey::Escalation(EscalationId::from("e1")));
        assert_eq!(row.counterpart.display_name(), "Someone");
        assert_eq!(row.preview.as_deref(), Some("Can I bring my dog?"));
    }
}
