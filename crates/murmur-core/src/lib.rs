// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Murmur conversation client.
//!
//! This crate provides the error taxonomy, the domain types exchanged with the
//! backend, and the traits behind which the backend and the credential issuer
//! are hidden. Every other crate in the workspace builds on these.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, MurmurError};
pub use types::{
    AgentId, ConversationCategory, ConversationId, Credential, EscalationId, EscalationStatus,
    Layer, MessageId, Role,
};

pub use traits::{Backend, ByteStream, CredentialSource};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationRecord, CounterpartRecord, Escalation, HistoryMessage};
    use std::str::FromStr;

    #[test]
    fn category_display_round_trips() {
        for category in ConversationCategory::ALL {
            let s = category.to_string();
            assert_eq!(ConversationCategory::from_str(&s).unwrap(), category);
        }
        assert_eq!(ConversationCategory::AgentActivity.to_string(), "agent_activity");
    }

    #[test]
    fn layer_defaults_to_public() {
        assert_eq!(Layer::default(), Layer::Public);
        assert_eq!(Layer::from_str("intimate").unwrap(), Layer::Intimate);
        assert!(Layer::from_str("secret").is_err());
    }

    #[test]
    fn role_accepts_assistant_alias() {
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Agent);
        assert_eq!(Role::Agent.to_string(), "agent");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Agent);
    }

    #[test]
    fn history_message_tolerates_missing_and_null_fields() {
        let rows: Vec<HistoryMessage> =
            serde_json::from_str(r#"[{"role":null,"content":"hi"},{}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, None);
        assert_eq!(rows[0].content.as_deref(), Some("hi"));
        assert_eq!(rows[1], HistoryMessage::default());
    }

    #[test]
    fn conversation_record_parses_tagged_counterpart() {
        let json = r#"{
            "id": "c1",
            "category": "direct_chat",
            "counterpart": {"kind": "agent", "id": "a1", "name": "Nova", "handle": "nova"}
        }"#;
        let record: ConversationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.unread_count, 0);
        match record.counterpart {
            CounterpartRecord::Agent(agent) => assert_eq!(agent.name, "Nova"),
            other => panic!("expected agent counterpart, got {other:?}"),
        }
    }

    #[test]
    fn escalation_parses_with_optional_fields() {
        let json = r#"{
            "id": "e1", "agent_id": "a1", "conversation_id": "c1",
            "requester": {"id": "u1"}, "question": "What is your favourite film?",
            "status": "pending"
        }"#;
        let escalation: Escalation = serde_json::from_str(json).unwrap();
        assert_eq!(escalation.status, EscalationStatus::Pending);
        assert!(escalation.context_summary.is_none());
        assert!(!escalation.status.is_terminal());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("super-secret", None);
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(credential.expose(), "super-secret");
    }

    #[test]
    fn provisional_ids_are_unique() {
        let a = MessageId::provisional();
        let b = MessageId::provisional();
        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(!MessageId::Server("m1".into()).is_provisional());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_backend<T: Backend>() {}
        fn _assert_credentials<T: CredentialSource>() {}
    }
}
